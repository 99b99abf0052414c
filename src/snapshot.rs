//! JSON snapshots of table contents.
//!
//! A snapshot is a JSON array with one plain object per item. Binary
//! attributes are written as `{"$b64": "<base64>"}` and read back as binary.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::dynamodb::Item;

/// Writes `items` to `path` as a pretty-printed JSON array.
pub fn write_items(path: &Path, items: &[Item]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, items)
        .with_context(|| format!("Failed to write snapshot '{}'", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!("Wrote {} items to '{}'", items.len(), path.display());
    Ok(())
}

/// Reads a snapshot written by [`write_items`], or any JSON array of objects.
pub fn read_items(path: &Path) -> Result<Vec<Item>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot '{}'", path.display()))?;
    let items: Vec<Item> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse snapshot '{}'", path.display()))?;

    info!("Read {} items from '{}'", items.len(), path.display());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::Value;
    use aws_sdk_dynamodb::primitives::Blob;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dynamo-lifecycle-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_write_then_read() -> Result<()> {
        let path = temp_path("snapshot.json");
        let items = vec![
            Item::new()
                .set_string("id", "a")
                .set_float("price", 9.5)
                .set("tags", vec![Value::from("x"), Value::from("y")]),
            Item::new().set_string("id", "b").set("gone", Value::Null),
        ];

        write_items(&path, &items)?;
        let read = read_items(&path)?;
        std::fs::remove_file(&path)?;

        assert_eq!(read, items);
        Ok(())
    }

    #[test]
    fn test_binary_attributes_survive() -> Result<()> {
        let path = temp_path("binary.json");
        let items = vec![Item::new()
            .set("digest", Value::Binary(vec![1, 2, 3]))
            .set("chunks", vec![Value::Binary(vec![0]), Value::Binary(vec![255])])];

        write_items(&path, &items)?;
        let text = std::fs::read_to_string(&path)?;
        let read = read_items(&path)?;
        std::fs::remove_file(&path)?;

        assert!(text.contains(r#""$b64": "AQID""#));
        assert_eq!(read, items);
        assert_eq!(
            read[0].to_record()["digest"],
            AttributeValue::B(Blob::new(vec![1u8, 2, 3]))
        );
        Ok(())
    }

    #[test]
    fn test_rejects_non_array() -> Result<()> {
        let path = temp_path("not-array.json");
        std::fs::write(&path, r#"{"id": "a"}"#)?;
        let result = read_items(&path);
        std::fs::remove_file(&path)?;

        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = read_items(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open snapshot"));
    }
}
