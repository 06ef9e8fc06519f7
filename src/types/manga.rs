use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum MangaStatus {
    #[default]
    Ongoing,
    Completed,
    Hiatus,
}

/// Publication origin: Japanese manga, Korean manhwa, Chinese manhua.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum MangaKind {
    #[default]
    Manga,
    Manhwa,
    Manhua,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MangaSort {
    #[default]
    Latest,
    Popular,
    Rating,
}

impl MangaSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            MangaSort::Latest => "m.updated_at DESC",
            MangaSort::Popular => "m.views_total DESC",
            MangaSort::Rating => "m.rating DESC",
        }
    }
}
