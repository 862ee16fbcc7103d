//! Console line commands.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Nothing,
    List,
    /// Play the library from an index, or resume without one.
    Play(Option<usize>),
    Pause,
    Toggle,
    Next,
    Prev,
    /// Absolute position in seconds.
    Seek(u64),
    /// Relative scrub in seconds.
    SeekBy(i64),
    Status,
    Playlists,
    Create(String),
    Delete(String),
    Show(String),
    Add { playlist: String, library_index: usize },
    Remove { playlist: String, index: usize },
    PlayPlaylist { playlist: String, start: usize },
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, rest)) = words.split_first() else {
            return Ok(Self::Nothing);
        };

        let cmd = match (head, rest) {
            ("ls", []) => Self::List,
            ("play", []) => Self::Play(None),
            ("play", [i]) => Self::Play(Some(index(i)?)),
            ("pause", []) => Self::Pause,
            ("toggle", []) => Self::Toggle,
            ("next", []) => Self::Next,
            ("prev", []) => Self::Prev,
            ("seek", [s]) => Self::Seek(seconds(s)?),
            ("fwd", [s]) => Self::SeekBy(offset(s)?),
            ("back", [s]) => Self::SeekBy(
                offset(s)?
                    .checked_neg()
                    .ok_or_else(|| format!("offset out of range: {s}"))?,
            ),
            ("status", []) => Self::Status,
            ("playlists", []) => Self::Playlists,
            ("pl", [verb, args @ ..]) => parse_playlist(verb, args)?,
            ("help" | "?", []) => Self::Help,
            ("quit" | "q" | "exit", []) => Self::Quit,
            _ => return Err(format!("unknown command: {}", line.trim())),
        };
        Ok(cmd)
    }
}

fn parse_playlist(verb: &str, args: &[&str]) -> Result<Command, String> {
    if args.is_empty() {
        return Err(format!("pl {verb}: missing playlist name"));
    }
    let whole = args.join(" ");
    let cmd = match verb {
        "create" => Command::Create(whole),
        "delete" => Command::Delete(whole),
        "show" => Command::Show(whole),
        "add" => {
            let (name, i) = name_and_index(args)
                .ok_or_else(|| "usage: pl add <name> <library-index>".to_string())?;
            Command::Add {
                playlist: name,
                library_index: index(i)?,
            }
        }
        "rm" => {
            let (name, i) = name_and_index(args)
                .ok_or_else(|| "usage: pl rm <name> <playlist-index>".to_string())?;
            Command::Remove {
                playlist: name,
                index: index(i)?,
            }
        }
        "play" => match name_and_index(args) {
            Some((name, i)) if i.parse::<usize>().is_ok() => Command::PlayPlaylist {
                playlist: name,
                start: index(i)?,
            },
            _ => Command::PlayPlaylist {
                playlist: whole,
                start: 0,
            },
        },
        _ => return Err(format!("unknown playlist command: {verb}")),
    };
    Ok(cmd)
}

/// Split `args` into a (possibly multi-word) name and a trailing index word.
fn name_and_index<'a>(args: &[&'a str]) -> Option<(String, &'a str)> {
    let (last, name) = args.split_last()?;
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), last))
}

fn index(word: &str) -> Result<usize, String> {
    word.parse().map_err(|_| format!("not an index: {word}"))
}

fn seconds(word: &str) -> Result<u64, String> {
    word.parse().map_err(|_| format!("not a number of seconds: {word}"))
}

/// A relative scrub: unsigned on the console, signed on the command surface.
fn offset(word: &str) -> Result<i64, String> {
    i64::try_from(seconds(word)?).map_err(|_| format!("offset out of range: {word}"))
}
