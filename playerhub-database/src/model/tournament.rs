use playerhub_core::model::tournament::Tournament;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub player_id: i64,
    pub username: String,
    pub position: i64,
    pub prize: i64,
    pub score: i64,
}

#[derive(Clone, Debug)]
pub struct TournamentSummary {
    pub tournament: Tournament,
    pub participants_count: i64,
}

#[derive(Clone, Debug)]
pub struct TournamentDetail {
    pub tournament: Tournament,
    pub participants_count: i64,
    pub results: Vec<Placement>,
    pub is_participant: bool,
}
