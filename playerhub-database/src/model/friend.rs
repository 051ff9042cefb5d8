use playerhub_core::model::friend::FriendRequest;

/// A pending request together with the sender's username.
#[derive(Clone, Debug)]
pub struct IncomingRequest {
    pub request: FriendRequest,
    pub from_username: String,
}
