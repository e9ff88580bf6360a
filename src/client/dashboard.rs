use crate::models::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardFilter {
    #[default]
    All,
    Starred,
    Closed,
}

/// A user's boards split the way the dashboard shows them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardGroups {
    /// Open boards that are not starred
    pub recent: Vec<Board>,
    /// Open, starred boards
    pub starred: Vec<Board>,
    pub closed: Vec<Board>,
}

impl DashboardGroups {
    pub fn from_boards(boards: &[Board]) -> Self {
        let mut groups = DashboardGroups::default();
        for b in boards {
            let bucket = match (b.is_closed, b.is_starred) {
                (true, _) => &mut groups.closed,
                (false, true) => &mut groups.starred,
                (false, false) => &mut groups.recent,
            };
            bucket.push(b.clone());
        }
        groups
    }

    /// Boards shown under `filter`. `All` lists starred boards before the rest.
    pub fn select(&self, filter: BoardFilter) -> Vec<&Board> {
        match filter {
            BoardFilter::All => self.starred.iter().chain(self.recent.iter()).collect(),
            BoardFilter::Starred => self.starred.iter().collect(),
            BoardFilter::Closed => self.closed.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn board(id: i64, starred: bool, closed: bool) -> Board {
        Board {
            id,
            user_id: Some(1),
            title: format!("b{id}"),
            description: None,
            backdrop: None,
            is_starred: starred,
            is_closed: closed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn closed_wins_over_starred() {
        let groups = DashboardGroups::from_boards(&[
            board(101, false, false),
            board(102, true, false),
            board(103, true, true),
        ]);
        let ids = |v: &[Board]| v.iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(ids(&groups.recent), vec![101]);
        assert_eq!(ids(&groups.starred), vec![102]);
        assert_eq!(ids(&groups.closed), vec![103]);

        let all: Vec<i64> = groups.select(BoardFilter::All).iter().map(|b| b.id).collect();
        assert_eq!(all, vec![102, 101]);
    }
}
