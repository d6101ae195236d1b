//! Загрузка сценария озвучки
//!
//! Сценарий читается из `.txt` или `.docx` и режется на предложения по
//! знакам конца предложения. Пустая строка в тексте - жёсткий разрыв.

use std::io::Read;
use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use regex::Regex;
use crate::error::{Result, StudioError};

lazy_static! {
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").expect("valid blank line regex");
    static ref SENTENCE_END: Regex = Regex::new(r"[.?!。？！]\s*").expect("valid sentence regex");
    static ref DOCX_PARAGRAPH: Regex =
        Regex::new(r"(?s)<w:p[ >].*?</w:p>").expect("valid paragraph regex");
    static ref DOCX_TEXT_RUN: Regex =
        Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").expect("valid text run regex");
}

/// Разбить текст на предложения
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");

    let mut sentences = Vec::new();
    for block in BLANK_LINES.split(&text) {
        let block = block.replace('\n', " ");
        let mut start = 0;
        for end in SENTENCE_END.find_iter(&block) {
            sentences.push(block[start..end.end()].trim().to_string());
            start = end.end();
        }
        sentences.push(block[start..].trim().to_string());
    }

    sentences.retain(|sentence| !sentence.is_empty());
    sentences
}

/// Откуда загружен сценарий; используется для имён выходных файлов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInfo {
    pub path: PathBuf,
    /// Имя файла без расширения
    pub stem: String,
    pub folder: PathBuf,
}

impl ScriptInfo {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string());
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self { path, stem, folder }
    }
}

/// Прочитать текст сценария из `.txt` или `.docx`
pub async fn read_script(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let content = match extension.as_str() {
        "txt" => tokio::fs::read_to_string(path).await?,
        "docx" => {
            let path = path.to_path_buf();
            tokio::task::spawn_blocking(move || read_docx(&path))
                .await
                .map_err(|e| StudioError::Other(format!("docx reader task failed: {}", e)))??
        }
        other => {
            return Err(StudioError::user_input(format!("unsupported file format: .{}", other)));
        }
    };

    if content.trim().is_empty() {
        return Err(StudioError::user_input("file has no content"));
    }
    Ok(content)
}

/// Абзацы документа Word, по одному на строку; пустые абзацы пропускаются
fn read_docx(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let paragraphs: Vec<String> = DOCX_PARAGRAPH
        .find_iter(&xml)
        .map(|paragraph| {
            DOCX_TEXT_RUN
                .captures_iter(paragraph.as_str())
                .filter_map(|run| run.get(1))
                .map(|text| unescape_xml(text.as_str()))
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;

    #[test]
    fn test_split_on_punctuation() {
        let sentences = split_into_sentences("Hello. World! How are you?Fine");
        assert_eq!(sentences, vec!["Hello.", "World!", "How are you?", "Fine"]);
    }

    #[test]
    fn test_single_newline_joins_and_blank_line_breaks() {
        let text = "First part\r\nof a sentence. Second\n\n  Heading without dot\nNext。다음！";
        assert_eq!(
            split_into_sentences(text),
            vec!["First part of a sentence.", "Second", "Heading without dot Next。", "다음！"]
        );
    }

    #[test]
    fn test_empty_text_has_no_sentences() {
        assert!(split_into_sentences(" \n\n \r\n").is_empty());
    }

    #[test]
    fn test_script_info() {
        let info = ScriptInfo::from_path("/work/episode.docx");
        assert_eq!(info.stem, "episode");
        assert_eq!(info.folder, PathBuf::from("/work"));
    }

    #[tokio::test]
    async fn test_read_txt_and_reject_empty() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.txt");
        std::fs::write(&script, "One. Two.").unwrap();
        assert_eq!(read_script(&script).await.unwrap(), "One. Two.");

        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "  \n").unwrap();
        assert!(read_script(&empty).await.unwrap_err().is_user_facing());

        let pdf = dir.path().join("script.pdf");
        std::fs::write(&pdf, "%PDF").unwrap();
        assert!(read_script(&pdf).await.unwrap_err().is_user_facing());
    }

    #[tokio::test]
    async fn test_read_docx_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.docx");
        let xml = concat!(
            r#"<?xml version="1.0"?><w:document><w:body>"#,
            r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">world.</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>  </w:t></w:r></w:p>"#,
            r#"<w:p w:rsidR="00A1"><w:r><w:t>Fish &amp; chips.</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            writer
                .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let content = read_script(&path).await.unwrap();
        assert_eq!(content, "Hello world.\nFish & chips.");
    }
}
