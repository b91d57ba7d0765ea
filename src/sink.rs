use crate::error::CrawlError;
use crate::results::ArticleRecord;
use crate::utils;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Column order of the output file
pub const CSV_HEADERS: [&str; 4] = ["title", "url", "source_time", "content"];

/// Byte order mark so spreadsheet tools read the file as UTF-8
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the header and one row per record to `out`
pub fn write_records<W: Write>(records: &[ArticleRecord], mut out: W) -> Result<(), CrawlError> {
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Saves `records` as `{prefix}_YYYYMMDD_HHMMSS.csv` in `dir`.
///
/// Nothing is written for an empty record set.
pub fn save(
    records: &[ArticleRecord],
    dir: &Path,
    prefix: &str,
) -> Result<Option<PathBuf>, CrawlError> {
    if records.is_empty() {
        return Ok(None);
    }

    let path = dir.join(utils::stamped_filename(prefix, "csv"));
    let file = File::create(&path)?;
    write_records(records, BufWriter::new(file))?;

    ::log::info!("CSV file saved: {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, content: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            url: "https://cn.chinadaily.com.cn/a/1.html".to_string(),
            source_time: "中国日报网 2024-11-20".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_header_and_bom() {
        let mut out = Vec::new();
        write_records(&[], &mut out).unwrap();
        assert_eq!(out, b"\xEF\xBB\xBFtitle,url,source_time,content\n");
    }

    #[test]
    fn test_non_ascii_and_quoting_survive() {
        let records = vec![
            record("气候大会开幕", "巴库, 阿塞拜疆 \"COP29\" 开幕。"),
            record("Second", "plain"),
        ];
        let mut out = Vec::new();
        write_records(&records, &mut out).unwrap();

        let text = std::str::from_utf8(&out[UTF8_BOM.len()..]).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().iter().collect::<Vec<_>>();
        assert_eq!(headers, CSV_HEADERS.to_vec());

        let read = reader
            .deserialize::<ArticleRecord>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_save_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(save(&[], dir.path(), "news").unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_names_file_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(&[record("t", "c")], dir.path(), "china_daily_climate_news")
            .unwrap()
            .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("china_daily_climate_news_"));
        assert!(name.ends_with(".csv"));
        assert!(path.exists());
    }
}
