use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use sitesurvey_core::{
    EntityValues, ImageId, MediaPart, RemoteImage, ScreenKey, ScreenSnapshot, SubmitRequest,
    decode_entities, encode_entities,
};

use crate::error::StorageError;
use crate::traits::{ContentHash, StoredImage, SurveyStore};

const DEFAULT_MEDIA_BASE_URL: &str = "/media";

/// Convert Vec<u8> to fixed-size array with proper error handling.
fn to_array<const N: usize>(v: Vec<u8>, label: &str) -> Result<[u8; N], StorageError> {
    v.try_into()
        .map_err(|_| StorageError::Serialization(format!("invalid {label} length")))
}

/// Reference persistence endpoint backed by SQLite.
pub struct SqliteStore {
    conn: Connection,
    media_base_url: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self {
            conn,
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self {
            conn,
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
        })
    }

    pub fn with_media_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.media_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn media_url(&self, image_id: ImageId, filename: &str) -> String {
        format!("{}/{image_id}/{filename}", self.media_base_url)
    }

    /// Number of successful saves for a screen, `None` if never saved.
    pub fn revision(&self, key: &ScreenKey) -> Result<Option<i64>, StorageError> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM screens WHERE site_id = ?1 AND screen = ?2",
                rusqlite::params![key.site_id.as_bytes().as_slice(), key.screen],
                |row| row.get(0),
            )
            .optional()?;
        Ok(revision)
    }

    pub fn images(&self, key: &ScreenKey) -> Result<Vec<StoredImage>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT m.image_id, m.slot, m.filename, m.content_hash, b.size
             FROM media m JOIN blobs b ON b.content_hash = m.content_hash
             WHERE m.site_id = ?1 AND m.screen = ?2 ORDER BY m.slot",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![key.site_id.as_bytes().as_slice(), key.screen],
            |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

        let mut result = Vec::new();
        for row in rows {
            let (image_id_bytes, slot, filename, hash_bytes, size) = row?;
            result.push(StoredImage {
                image_id: ImageId::from_bytes(to_array::<16>(image_id_bytes, "image_id")?),
                slot,
                filename,
                content_hash: ContentHash::from_bytes(to_array::<32>(hash_bytes, "content_hash")?),
                size: u64::try_from(size)
                    .map_err(|_| StorageError::Serialization(format!("negative blob size {size}")))?,
            });
        }
        Ok(result)
    }

    pub fn image_bytes(&self, image_id: ImageId) -> Result<Vec<u8>, StorageError> {
        self.conn
            .query_row(
                "SELECT b.bytes FROM media m JOIN blobs b ON b.content_hash = m.content_hash
                 WHERE m.image_id = ?1",
                rusqlite::params![image_id.as_bytes().as_slice()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("image {image_id}")))
    }

    fn load_entities(&self, key: &ScreenKey) -> Result<Vec<EntityValues>, StorageError> {
        let bytes: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT entities FROM screens WHERE site_id = ?1 AND screen = ?2",
                rusqlite::params![key.site_id.as_bytes().as_slice(), key.screen],
                |row| row.get(0),
            )
            .optional()?;
        match bytes {
            Some(bytes) => Ok(decode_entities(&bytes)?),
            None => Ok(Vec::new()),
        }
    }
}

impl SurveyStore for SqliteStore {
    fn load(&self, key: &ScreenKey) -> Result<ScreenSnapshot, StorageError> {
        let entities = self.load_entities(key)?;
        let media: BTreeMap<String, RemoteImage> = self
            .images(key)?
            .into_iter()
            .map(|image| {
                let remote = RemoteImage {
                    id: image.image_id,
                    url: self.media_url(image.image_id, &image.filename),
                    filename: image.filename,
                };
                (image.slot, remote)
            })
            .collect();
        Ok(ScreenSnapshot { entities, media })
    }

    fn save(
        &mut self,
        key: &ScreenKey,
        request: &SubmitRequest,
    ) -> Result<ScreenSnapshot, StorageError> {
        let entities = encode_entities(&request.entities)?;
        let site_id = key.site_id.as_bytes().as_slice();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO screens (site_id, screen, entities, revision) VALUES (?1, ?2, ?3, 1)
             ON CONFLICT (site_id, screen) DO UPDATE SET
                entities = excluded.entities,
                revision = revision + 1,
                updated_at = CAST(unixepoch('now','subsec') * 1000 AS INTEGER)",
            rusqlite::params![site_id, key.screen, entities],
        )?;

        for (slot, part) in &request.media {
            match part {
                MediaPart::Binary { filename, bytes } => {
                    let hash = ContentHash::of(bytes);
                    tx.execute(
                        "INSERT OR IGNORE INTO blobs (content_hash, bytes, size) VALUES (?1, ?2, ?3)",
                        rusqlite::params![hash.as_bytes().as_slice(), bytes, bytes.len() as i64],
                    )?;
                    let image_id = ImageId::new();
                    tx.execute(
                        "INSERT OR REPLACE INTO media (site_id, screen, slot, image_id, filename, content_hash)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        rusqlite::params![
                            site_id,
                            key.screen,
                            slot,
                            image_id.as_bytes().as_slice(),
                            filename,
                            hash.as_bytes().as_slice(),
                        ],
                    )?;
                    tracing::debug!(screen = %key, slot = %slot, image = %image_id, "Stored image");
                }
                MediaPart::EmptyMarker => {
                    let deleted = tx.execute(
                        "DELETE FROM media WHERE site_id = ?1 AND screen = ?2 AND slot = ?3",
                        rusqlite::params![site_id, key.screen, slot],
                    )?;
                    tracing::debug!(screen = %key, slot = %slot, deleted, "Cleared image slot");
                }
            }
        }
        tx.commit()?;

        tracing::debug!(
            screen = %key,
            entities = request.entities.len(),
            media_parts = request.media.len(),
            "Screen saved"
        );
        self.load(key)
    }
}
