use std::fmt;

/// Song derived from the player's window title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub title: String,
    pub artist: String,
}

impl fmt::Display for SongInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artist.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.title, self.artist)
        }
    }
}

/// Derive the current song from the window title text.
///
/// An empty title or a title equal to the bare process name means no song
/// is playing. Otherwise the title splits on the first `" - "` into title
/// and artist; titles without a separator keep the artist empty.
pub fn parse_window_title(title: &str, process_name: &str) -> Option<SongInfo> {
    let title = title.trim();
    if title.is_empty() || title == process_name {
        return None;
    }
    match title.split_once(" - ") {
        Some((song, artist)) => Some(SongInfo {
            title: song.trim().to_string(),
            artist: artist.trim().to_string(),
        }),
        None => Some(SongInfo {
            title: title.to_string(),
            artist: String::new(),
        }),
    }
}
