// src/store/artworks.rs — SQLite operations for artworks

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::flow::questions::Response;

const SHARE_CODE_LEN: usize = 8;
const SHARE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const COLUMNS: &str = "id, session_id, image_url, image_path, prompt, responses, style, themes,
     created_at, updated_at, share_code, view_count, likes, featured, demo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkAnswer {
    pub question_id: String,
    pub answer: String,
}

impl From<&Response> for ArtworkAnswer {
    fn from(r: &Response) -> Self {
        Self {
            question_id: r.question_id.clone(),
            answer: r.selected_answer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: String,
    pub session_id: String,
    pub image_url: String,
    #[serde(default)]
    pub image_path: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub responses: Vec<ArtworkAnswer>,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub themes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub share_code: String,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub demo: bool,
}

/// Fields supplied by the caller when saving a freshly generated artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtwork {
    pub id: String,
    pub session_id: String,
    pub image_url: String,
    pub image_path: Option<String>,
    pub prompt: String,
    pub responses: Vec<ArtworkAnswer>,
    pub style: String,
    pub themes: Vec<String>,
    pub demo: bool,
}

impl NewArtwork {
    pub fn new(session_id: &str, image_url: &str, prompt: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            image_url: image_url.to_string(),
            image_path: None,
            prompt: prompt.to_string(),
            responses: Vec::new(),
            style: String::new(),
            themes: Vec::new(),
            demo: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryStats {
    pub total: i64,
    pub today: i64,
    pub featured: i64,
    pub total_likes: i64,
    pub total_views: i64,
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_err<E: std::error::Error + Send + Sync + 'static>(idx: usize, e: E) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn row_to_artwork(row: &Row<'_>) -> rusqlite::Result<Artwork> {
    let responses: String = row.get(5)?;
    let themes: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Artwork {
        id: row.get(0)?,
        session_id: row.get(1)?,
        image_url: row.get(2)?,
        image_path: row.get(3)?,
        prompt: row.get(4)?,
        responses: serde_json::from_str(&responses).map_err(|e| conversion_err(5, e))?,
        style: row.get(6)?,
        themes: serde_json::from_str(&themes).map_err(|e| conversion_err(7, e))?,
        created_at: parse_time(8, &created_at)?,
        updated_at: parse_time(9, &updated_at)?,
        share_code: row.get(10)?,
        view_count: row.get(11)?,
        likes: row.get(12)?,
        featured: row.get(13)?,
        demo: row.get(14)?,
    })
}

/// Random share code from the OS CSPRNG, rejection-sampled to avoid modulo bias.
pub fn generate_share_code() -> anyhow::Result<String> {
    let reject_at = (256 - (256 % SHARE_CODE_CHARSET.len())) as u16;
    let mut code = String::with_capacity(SHARE_CODE_LEN);
    let mut buf = [0u8; SHARE_CODE_LEN * 2];

    while code.len() < SHARE_CODE_LEN {
        getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("getrandom failed: {e}"))?;
        for &b in &buf {
            if code.len() >= SHARE_CODE_LEN {
                break;
            }
            if u16::from(b) < reject_at {
                code.push(SHARE_CODE_CHARSET[b as usize % SHARE_CODE_CHARSET.len()] as char);
            }
        }
    }
    Ok(code)
}

/// Low-level SQLite operations for the gallery.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn unused_share_code(&self) -> anyhow::Result<String> {
        for _ in 0..8 {
            let code = generate_share_code()?;
            let taken: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM artworks WHERE share_code = ?1)",
                [&code],
                |r| r.get(0),
            )?;
            if !taken {
                return Ok(code);
            }
        }
        anyhow::bail!("could not find a free share code")
    }

    // -- Writes --

    pub fn insert_artwork(&self, new: &NewArtwork) -> anyhow::Result<Artwork> {
        self.insert_with_times(new, Utc::now(), None)
    }

    fn insert_with_times(
        &self,
        new: &NewArtwork,
        created_at: DateTime<Utc>,
        share_code: Option<&str>,
    ) -> anyhow::Result<Artwork> {
        let share_code = match share_code {
            Some(code) => code.to_string(),
            None => self.unused_share_code()?,
        };
        let now = timestamp(&created_at);
        self.conn.execute(
            "INSERT INTO artworks (id, session_id, image_url, image_path, prompt, responses,
             style, themes, created_at, updated_at, share_code, demo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10, ?11)",
            params![
                new.id,
                new.session_id,
                new.image_url,
                new.image_path,
                new.prompt,
                serde_json::to_string(&new.responses)?,
                new.style,
                serde_json::to_string(&new.themes)?,
                now,
                share_code,
                new.demo,
            ],
        )?;
        self.get_artwork(&new.id)?
            .ok_or_else(|| anyhow::anyhow!("artwork {} vanished after insert", new.id))
    }

    pub fn add_like(&self, id: &str) -> anyhow::Result<Option<Artwork>> {
        let changed = self.conn.execute(
            "UPDATE artworks SET likes = likes + 1, updated_at = ?1 WHERE id = ?2",
            params![timestamp(&Utc::now()), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_artwork(id)
    }

    pub fn set_featured(&self, id: &str, featured: bool) -> anyhow::Result<Option<Artwork>> {
        let changed = self.conn.execute(
            "UPDATE artworks SET featured = ?1, updated_at = ?2 WHERE id = ?3",
            params![featured, timestamp(&Utc::now()), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_artwork(id)
    }

    /// Delete and return the removed row so the caller can drop its image file.
    pub fn delete_artwork(&self, id: &str) -> anyhow::Result<Option<Artwork>> {
        let existing = self.get_artwork(id)?;
        if existing.is_some() {
            self.conn
                .execute("DELETE FROM artworks WHERE id = ?1", [id])?;
        }
        Ok(existing)
    }

    /// Keep only the newest `max` artworks. Returns the removed rows.
    pub fn trim_to(&self, max: u32) -> anyhow::Result<Vec<Artwork>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM artworks
             ORDER BY created_at DESC, rowid DESC
             LIMIT -1 OFFSET ?1"
        ))?;
        let doomed = stmt
            .query_map([max], row_to_artwork)?
            .collect::<Result<Vec<_>, _>>()?;

        for artwork in &doomed {
            self.conn
                .execute("DELETE FROM artworks WHERE id = ?1", [&artwork.id])?;
        }
        Ok(doomed)
    }

    // -- Reads --

    pub fn get_artwork(&self, id: &str) -> anyhow::Result<Option<Artwork>> {
        let artwork = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM artworks WHERE id = ?1"),
                [id],
                row_to_artwork,
            )
            .optional()?;
        Ok(artwork)
    }

    /// Look up by share code and count the view.
    pub fn get_by_share_code(&self, code: &str) -> anyhow::Result<Option<Artwork>> {
        let changed = self.conn.execute(
            "UPDATE artworks SET view_count = view_count + 1 WHERE share_code = ?1",
            [code],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let artwork = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM artworks WHERE share_code = ?1"),
                [code],
                row_to_artwork,
            )
            .optional()?;
        Ok(artwork)
    }

    /// Share code first, then id (older links carried the id).
    pub fn find_by_code_or_id(&self, code: &str) -> anyhow::Result<Option<Artwork>> {
        if let Some(artwork) = self.get_by_share_code(code)? {
            return Ok(Some(artwork));
        }
        self.get_artwork(code)
    }

    /// Newest first.
    pub fn recent_artworks(&self, limit: u32, offset: u32) -> anyhow::Result<Vec<Artwork>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM artworks
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
            .query_map(params![limit, offset], row_to_artwork)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn featured_artworks(&self) -> anyhow::Result<Vec<Artwork>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM artworks WHERE featured = 1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
            .query_map([], row_to_artwork)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_artworks(&self) -> anyhow::Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM artworks", [], |r| r.get(0))?;
        Ok(count)
    }

    pub fn gallery_stats(&self) -> anyhow::Result<GalleryStats> {
        let midnight = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| t.and_local_timezone(Local).earliest())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(featured), 0),
                    COALESCE(SUM(likes), 0),
                    COALESCE(SUM(view_count), 0)
             FROM artworks",
            [timestamp(&midnight)],
            |r| {
                Ok(GalleryStats {
                    total: r.get(0)?,
                    today: r.get(1)?,
                    featured: r.get(2)?,
                    total_likes: r.get(3)?,
                    total_views: r.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }

    // -- Export / import --

    pub fn export_json(&self) -> anyhow::Result<String> {
        let all = self.recent_artworks(u32::MAX, 0)?;
        Ok(serde_json::to_string_pretty(&all)?)
    }

    /// Import an exported gallery. Rows whose id already exists are skipped;
    /// clashing share codes are replaced. Returns the number imported.
    pub fn import_json(&self, data: &str) -> anyhow::Result<usize> {
        let artworks: Vec<Artwork> = serde_json::from_str(data)?;
        let tx = self.conn.unchecked_transaction()?;
        let mut imported = 0;

        for artwork in artworks {
            if self.get_artwork(&artwork.id)?.is_some() {
                continue;
            }
            let code_taken: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM artworks WHERE share_code = ?1)",
                [&artwork.share_code],
                |r| r.get(0),
            )?;
            let new = NewArtwork {
                id: artwork.id.clone(),
                session_id: artwork.session_id.clone(),
                image_url: artwork.image_url.clone(),
                image_path: artwork.image_path.clone(),
                prompt: artwork.prompt.clone(),
                responses: artwork.responses.clone(),
                style: artwork.style.clone(),
                themes: artwork.themes.clone(),
                demo: artwork.demo,
            };
            let code = (!code_taken && !artwork.share_code.is_empty())
                .then_some(artwork.share_code.as_str());
            self.insert_with_times(&new, artwork.created_at, code)?;
            self.conn.execute(
                "UPDATE artworks SET view_count = ?1, likes = ?2, featured = ?3 WHERE id = ?4",
                params![artwork.view_count, artwork.likes, artwork.featured, artwork.id],
            )?;
            imported += 1;
        }

        tx.commit()?;
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_code_shape() {
        let code = generate_share_code().unwrap();
        assert_eq!(code.len(), SHARE_CODE_LEN);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_share_codes_differ() {
        let a = generate_share_code().unwrap();
        let b = generate_share_code().unwrap();
        assert_ne!(a, b);
    }
}
