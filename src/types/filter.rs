//! Closed filter vocabularies accepted by the upstream search endpoints.

use serde::{Deserialize, Serialize};

/// Declare a filter enum whose serde names and query values are the same string.
macro_rules! filter_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Value sent to the upstream as a query parameter.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

filter_enum! {
    /// Anime media type.
    AnimeType {
        Tv => "tv",
        Movie => "movie",
        Ova => "ova",
        Special => "special",
        Ona => "ona",
        Music => "music",
        Cm => "cm",
        Pv => "pv",
        TvSpecial => "tv_special",
    }
}

filter_enum! {
    /// Manga publication type.
    MangaType {
        Manga => "manga",
        Novel => "novel",
        LightNovel => "lightnovel",
        OneShot => "oneshot",
        Doujin => "doujin",
        Manhwa => "manhwa",
        Manhua => "manhua",
    }
}

filter_enum! {
    /// Airing status of an anime.
    AnimeStatus {
        Airing => "airing",
        Complete => "complete",
        Upcoming => "upcoming",
    }
}

filter_enum! {
    /// Publishing status of a manga.
    MangaStatus {
        Publishing => "publishing",
        Complete => "complete",
        Hiatus => "hiatus",
        Discontinued => "discontinued",
        Upcoming => "upcoming",
    }
}

filter_enum! {
    /// Audience rating (anime only).
    Rating {
        G => "g",
        Pg => "pg",
        Pg13 => "pg13",
        R17 => "r17",
        R => "r",
        Rx => "rx",
    }
}

filter_enum! {
    /// Result ordering field.
    ///
    /// `Episodes` only applies to anime; `Chapters` and `Volumes` only to manga.
    OrderBy {
        MalId => "mal_id",
        Title => "title",
        StartDate => "start_date",
        EndDate => "end_date",
        Episodes => "episodes",
        Chapters => "chapters",
        Volumes => "volumes",
        Score => "score",
        ScoredBy => "scored_by",
        Rank => "rank",
        Popularity => "popularity",
        Members => "members",
        Favorites => "favorites",
    }
}

filter_enum! {
    /// Sort direction.
    SortOrder {
        Asc => "asc",
        Desc => "desc",
    }
}
