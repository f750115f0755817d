//! Streaming decoder for MusicBrainz XML responses
//!
//! Walks the document forward-only with a pull reader. Each nesting level has its
//! own helper that recognises a handful of element names, skips every other
//! subtree whole, and returns once its own element closes:
//!
//! ```text
//! <metadata>
//!   <release-list>                 read_release_list
//!     <release id="...">           read_release
//!       <title/> <date/> <annotation/> <release-group id="..."/>
//!       <artist-credit>            read_artist_credit  (first name-credit only)
//!         <name-credit>            read_name_credit    (first artist only)
//!           <artist id="...">      read_artist
//!             <name/>
//! ```
//!
//! Self-closing elements are never descended into. Declarations, comments and
//! processing instructions are ignored, and nothing is validated against a schema.

use crate::error::DecodeError;
use crate::models::{ArtistCredit, ReleaseRecord};
use chrono::{Datelike, NaiveDate};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;
use tracing::trace;

const RELEASE_LIST: &str = "release-list";
const RELEASE: &str = "release";
const RELEASE_GROUP_LIST: &str = "release-group-list";
const RELEASE_GROUP: &str = "release-group";
const ARTIST_CREDIT: &str = "artist-credit";
const NAME_CREDIT: &str = "name-credit";
const ARTIST: &str = "artist";

/// Owned copy of an opening tag, detached from the reader buffer
struct Tag {
    qname: Vec<u8>,
    local: Vec<u8>,
    id: Option<String>,
    /// `<tag/>`: there is no content and no closing event
    empty: bool,
}

impl Tag {
    fn from_start(start: &BytesStart<'_>, empty: bool) -> Result<Self, DecodeError> {
        let id = match start.try_get_attribute("id")? {
            Some(attr) => Some(attr.unescape_value()?.into_owned()),
            None => None,
        };

        Ok(Self {
            qname: start.name().as_ref().to_vec(),
            local: start.local_name().as_ref().to_vec(),
            id,
            empty,
        })
    }

    fn is(&self, local_name: &str) -> bool {
        self.local == local_name.as_bytes()
    }

    fn eof_error(&self) -> DecodeError {
        DecodeError::UnexpectedEof {
            element: String::from_utf8_lossy(&self.qname).into_owned(),
        }
    }
}

/// Reader event reduced to what the walk cares about
enum Node {
    Open(Tag),
    Close,
    Text(String),
    Eof,
    /// Declaration, comment, processing instruction, doctype
    Ignored,
}

/// Pull-style walker over one response body
pub struct ReleaseDecoder<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> ReleaseDecoder<R> {
    pub fn new(input: R) -> Self {
        // Text is trimmed once per element in `read_text`, never per event
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
        }
    }

    /// Decode every `<release>` of the first `<release-list>`, in document order
    pub async fn decode_releases(mut self) -> Result<Vec<ReleaseRecord>, DecodeError> {
        let Some(root) = self.enter_root().await? else {
            return Ok(Vec::new());
        };
        if root.is(RELEASE_LIST) {
            return self.read_release_list(&root).await;
        }

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(RELEASE_LIST) => {
                    if tag.empty {
                        continue;
                    }
                    return self.read_release_list(&tag).await;
                }
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(Vec::new()),
                Node::Eof => return Err(root.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    /// Id attribute of the first `<release-group>` inside `<release-group-list>`
    pub async fn decode_first_release_group_id(mut self) -> Result<Option<String>, DecodeError> {
        let Some(root) = self.enter_root().await? else {
            return Ok(None);
        };
        if root.is(RELEASE_GROUP_LIST) {
            return self.read_first_release_group_id(&root).await;
        }

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(RELEASE_GROUP_LIST) => {
                    if tag.empty {
                        continue;
                    }
                    return self.read_first_release_group_id(&tag).await;
                }
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(None),
                Node::Eof => return Err(root.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    async fn next_node(&mut self) -> Result<Node, DecodeError> {
        self.buf.clear();
        let node = match self.reader.read_event_into_async(&mut self.buf).await? {
            Event::Start(start) => Node::Open(Tag::from_start(&start, false)?),
            Event::Empty(start) => Node::Open(Tag::from_start(&start, true)?),
            Event::End(_) => Node::Close,
            // Unknown entities are kept verbatim rather than failing the document
            Event::Text(text) => Node::Text(match text.unescape() {
                Ok(unescaped) => unescaped.into_owned(),
                Err(_) => String::from_utf8_lossy(&text).into_owned(),
            }),
            Event::CData(cdata) => Node::Text(String::from_utf8_lossy(&cdata).into_owned()),
            Event::Eof => Node::Eof,
            _ => Node::Ignored,
        };
        Ok(node)
    }

    /// Position the reader inside the document element
    ///
    /// Returns `None` for an empty document or a self-closing root.
    async fn enter_root(&mut self) -> Result<Option<Tag>, DecodeError> {
        loop {
            match self.next_node().await? {
                Node::Open(tag) => return Ok((!tag.empty).then_some(tag)),
                Node::Close | Node::Eof => return Ok(None),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    /// Consume `tag` and all of its descendants
    async fn skip(&mut self, tag: &Tag) -> Result<(), DecodeError> {
        if tag.empty {
            return Ok(());
        }

        self.buf.clear();
        self.reader
            .read_to_end_into_async(QName(&tag.qname), &mut self.buf)
            .await?;
        Ok(())
    }

    /// Concatenated text content of `tag`, trimmed; nested elements are skipped
    async fn read_text(&mut self, tag: &Tag) -> Result<String, DecodeError> {
        let mut text = String::new();
        if tag.empty {
            return Ok(text);
        }

        loop {
            match self.next_node().await? {
                Node::Text(segment) => text.push_str(&segment),
                Node::Open(child) => self.skip(&child).await?,
                Node::Close => return Ok(text.trim().to_string()),
                Node::Eof => return Err(tag.eof_error()),
                Node::Ignored => {}
            }
        }
    }

    async fn read_release_list(&mut self, list: &Tag) -> Result<Vec<ReleaseRecord>, DecodeError> {
        let mut releases = Vec::new();

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(RELEASE) => match tag.id.clone() {
                    Some(id) if !tag.empty => releases.push(self.read_release(&tag, id).await?),
                    _ => {
                        trace!(id = ?tag.id, "Skipping release without id or content");
                        self.skip(&tag).await?;
                    }
                },
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(releases),
                Node::Eof => return Err(list.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    async fn read_release(&mut self, release: &Tag, id: String) -> Result<ReleaseRecord, DecodeError> {
        let mut record = ReleaseRecord::new(id);

        loop {
            let child = match self.next_node().await? {
                Node::Open(child) => child,
                Node::Close => return Ok(record),
                Node::Eof => return Err(release.eof_error()),
                Node::Text(_) | Node::Ignored => continue,
            };

            match child.local.as_slice() {
                b"title" => record.title = Some(self.read_text(&child).await?),
                b"date" => {
                    let date = self.read_text(&child).await?;
                    if let Some(year) = parse_year(&date) {
                        record.year = Some(year);
                    }
                }
                b"annotation" => record.overview = Some(self.read_text(&child).await?),
                b"release-group" => {
                    record.release_group_id = child.id.clone();
                    self.skip(&child).await?;
                }
                b"artist-credit" => {
                    if let Some(credit) = self.read_artist_credit(&child).await? {
                        record.artists.push(credit);
                    }
                }
                _ => self.skip(&child).await?,
            }
        }
    }

    /// Primary artist of a credit: only the first `<name-credit>` is read
    async fn read_artist_credit(&mut self, credit: &Tag) -> Result<Option<ArtistCredit>, DecodeError> {
        if credit.empty {
            return Ok(None);
        }

        let mut primary = None;
        let mut seen_name_credit = false;

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(NAME_CREDIT) && !seen_name_credit => {
                    seen_name_credit = true;
                    primary = self.read_name_credit(&tag).await?;
                }
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(primary),
                Node::Eof => return Err(credit.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    /// First `<artist>` only; without an id or a name it produces nothing
    async fn read_name_credit(&mut self, name_credit: &Tag) -> Result<Option<ArtistCredit>, DecodeError> {
        if name_credit.empty {
            return Ok(None);
        }

        let mut credit = None;
        let mut seen_artist = false;

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(ARTIST) && !seen_artist => {
                    seen_artist = true;
                    let Some(artist_id) = tag.id.clone() else {
                        self.skip(&tag).await?;
                        continue;
                    };
                    credit = self
                        .read_artist(&tag)
                        .await?
                        .filter(|name| !name.is_empty())
                        .map(|name| ArtistCredit {
                            name,
                            artist_id: Some(artist_id),
                        });
                }
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(credit),
                Node::Eof => return Err(name_credit.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    async fn read_artist(&mut self, artist: &Tag) -> Result<Option<String>, DecodeError> {
        if artist.empty {
            return Ok(None);
        }

        let mut name = None;

        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is("name") && name.is_none() => {
                    name = Some(self.read_text(&tag).await?);
                }
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(name),
                Node::Eof => return Err(artist.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }

    async fn read_first_release_group_id(&mut self, list: &Tag) -> Result<Option<String>, DecodeError> {
        loop {
            match self.next_node().await? {
                Node::Open(tag) if tag.is(RELEASE_GROUP) => return Ok(tag.id),
                Node::Open(tag) => self.skip(&tag).await?,
                Node::Close => return Ok(None),
                Node::Eof => return Err(list.eof_error()),
                Node::Text(_) | Node::Ignored => {}
            }
        }
    }
}

/// Decode the release list of a search or browse response
pub async fn decode_releases<R: AsyncBufRead + Unpin>(
    input: R,
) -> Result<Vec<ReleaseRecord>, DecodeError> {
    ReleaseDecoder::new(input).decode_releases().await
}

/// Decode the first release-group id of a release-group search response
pub async fn decode_first_release_group_id<R: AsyncBufRead + Unpin>(
    input: R,
) -> Result<Option<String>, DecodeError> {
    ReleaseDecoder::new(input).decode_first_release_group_id().await
}

/// Year of a MusicBrainz date (`YYYY-MM-DD`, `YYYY-MM` or `YYYY`)
pub fn parse_year(date: &str) -> Option<i32> {
    let date = date.trim();
    let full = match date.len() {
        10 => date.to_string(),
        7 => format!("{}-01", date),
        4 => format!("{}-01-01", date),
        _ => return None,
    };

    NaiveDate::parse_from_str(&full, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}
