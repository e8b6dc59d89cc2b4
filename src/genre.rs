//! Bandcamp's fixed genre taxonomy.

/// One entry of the genre taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genre {
    pub id: u64,
    pub label: &'static str,
    pub slug: &'static str,
}

const fn genre(id: u64, label: &'static str, slug: &'static str) -> Genre {
    Genre { id, label, slug }
}

/// All genres, in the order Bandcamp lists them.
pub const GENRES: &[Genre] = &[
    genre(10, "electronic", "electronic"),
    genre(23, "rock", "rock"),
    genre(18, "metal", "metal"),
    genre(2, "alternative", "alternative"),
    genre(14, "hip-hop/rap", "hip-hop-rap"),
    genre(11, "experimental", "experimental"),
    genre(20, "punk", "punk"),
    genre(12, "folk", "folk"),
    genre(19, "pop", "pop"),
    genre(3, "ambient", "ambient"),
    genre(24, "soundtrack", "soundtrack"),
    genre(26, "world", "world"),
    genre(15, "jazz", "jazz"),
    genre(1, "acoustic", "acoustic"),
    genre(13, "funk", "funk"),
    genre(21, "r&b/soul", "r-b-soul"),
    genre(9, "devotional", "devotional"),
    genre(5, "classical", "classical"),
    genre(22, "reggae", "reggae"),
    genre(27, "podcasts", "podcasts"),
    genre(7, "country", "country"),
    genre(25, "spoken word", "spoken-word"),
    genre(6, "comedy", "comedy"),
    genre(4, "blues", "blues"),
    genre(16, "kids", "kids"),
    genre(28, "audiobooks", "audiobooks"),
    genre(17, "latin", "latin"),
];

/// Look up a genre by its slug.
pub fn by_slug(slug: &str) -> Option<&'static Genre> {
    GENRES.iter().find(|g| g.slug == slug)
}

/// Look up a genre by its numeric id.
pub fn by_id(id: u64) -> Option<&'static Genre> {
    GENRES.iter().find(|g| g.id == id)
}
