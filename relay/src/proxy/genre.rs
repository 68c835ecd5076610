use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("Invalid genre")]
pub struct UnknownGenre(pub String);

/// Genres exposed by `/tmdb/category/:genre`, keyed by their TMDB id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Action,
    Comedy,
    Horror,
    Romance,
    Drama,
    Thriller,
    SciFi,
}

impl Genre {
    pub const ALL: [Genre; 7] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Horror,
        Genre::Romance,
        Genre::Drama,
        Genre::Thriller,
        Genre::SciFi,
    ];

    pub fn code(self) -> u32 {
        match self {
            Genre::Action => 28,
            Genre::Comedy => 35,
            Genre::Horror => 27,
            Genre::Romance => 10749,
            Genre::Drama => 18,
            Genre::Thriller => 53,
            Genre::SciFi => 878,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Comedy => "comedy",
            Genre::Horror => "horror",
            Genre::Romance => "romance",
            Genre::Drama => "drama",
            Genre::Thriller => "thriller",
            Genre::SciFi => "sci-fi",
        }
    }
}

impl FromStr for Genre {
    type Err = UnknownGenre;

    /// Case-insensitive lookup by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.name() == wanted)
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}
