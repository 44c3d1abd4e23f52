use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook};

use crate::pipeline::FileRecord;

pub const SHEET_NAME: &str = "Relatório de Vulnerabilidades";
pub const HEADERS: [&str; 3] = ["Arquivo", "Código Limpo Analisado", "Resultado da Análise"];
pub const NO_FILES_MESSAGE: &str = "Nenhum arquivo de código foi encontrado ou processado.";

const COLUMN_WIDTHS: [f64; 3] = [40.0, 70.0, 70.0];
const TITLE_FILL: u32 = 0x4F81BD;
const TITLE_ROW: u32 = 0;
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;
const LAST_COL: u16 = HEADERS.len() as u16 - 1;
/// Excel rejects cell strings longer than this many characters.
const MAX_CELL_CHARS: usize = 32_767;

pub fn title(model: &str) -> String {
    format!("Relatório de Análise de Vulnerabilidades (Modelo IA: {model})")
}

/// Location of the workbook for `model`: `<root>/<root name> - <model>.xlsx`,
/// with path separators in the model identifier replaced by `-`.
pub fn report_path(root: &Path, model: &str) -> PathBuf {
    let folder = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "report".to_string());
    let sanitized = model.replace(['/', '\\'], "-");
    root.join(format!("{folder} - {sanitized}.xlsx"))
}

struct Styles {
    title: Format,
    header: Format,
    cell: Format,
}

impl Styles {
    fn new() -> Self {
        let border = FormatBorder::Thin;
        Self {
            title: Format::new()
                .set_font_name("Calibri")
                .set_font_size(16)
                .set_bold()
                .set_font_color(Color::White)
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(TITLE_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            header: Format::new()
                .set_font_name("Calibri")
                .set_font_size(12)
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap()
                .set_border(border),
            cell: Format::new()
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::Top)
                .set_text_wrap()
                .set_border(border),
        }
    }
}

/// Lay out one model's results as a single-sheet workbook.
pub fn build_workbook(model: &str, records: &[FileRecord]) -> Result<Workbook> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    sheet.merge_range(TITLE_ROW, 0, TITLE_ROW, LAST_COL, &title(model), &styles.title)?;
    sheet.set_row_height(TITLE_ROW, 30)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(HEADER_ROW, col as u16, *header, &styles.header)?;
    }
    sheet.set_row_height(HEADER_ROW, 25)?;

    if records.is_empty() {
        sheet.merge_range(
            FIRST_DATA_ROW,
            0,
            FIRST_DATA_ROW,
            LAST_COL,
            NO_FILES_MESSAGE,
            &Format::new(),
        )?;
    }
    for (row, record) in (FIRST_DATA_ROW..).zip(records) {
        let cells = [
            record.relative_path.as_str(),
            record.normalized_text.trim(),
            record.verdict_text.as_str(),
        ];
        for (col, value) in cells.into_iter().enumerate() {
            sheet.write_string_with_format(row, col as u16, fit_cell(value), &styles.cell)?;
        }
    }

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    Ok(workbook)
}

/// Build and save the workbook for `model` at `path`.
pub fn write_report(path: &Path, model: &str, records: &[FileRecord]) -> Result<()> {
    let mut workbook = build_workbook(model, records)
        .with_context(|| format!("failed to lay out report for model {model}"))?;
    workbook
        .save(path)
        .with_context(|| format!("failed to save report to {}", path.display()))?;
    Ok(())
}

fn fit_cell(input: &str) -> String {
    if input.chars().count() <= MAX_CELL_CHARS {
        return input.to_string();
    }
    input.chars().take(MAX_CELL_CHARS - 1).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RecordStatus;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn record(path: &str, code: &str, verdict: &str) -> FileRecord {
        FileRecord {
            relative_path: path.into(),
            status: RecordStatus::Analyzed,
            normalized_text: code.into(),
            verdict_text: verdict.into(),
        }
    }

    fn read_back(model: &str, records: &[FileRecord]) -> Xlsx<Cursor<Vec<u8>>> {
        let mut workbook = build_workbook(model, records).unwrap();
        let buffer = workbook.save_to_buffer().unwrap();
        open_workbook_from_rs(Cursor::new(buffer)).expect("generated workbook should open")
    }

    fn text(cell: Option<&Data>) -> String {
        cell.map(|value| value.to_string()).unwrap_or_default()
    }

    #[test]
    fn writes_title_headers_and_one_row_per_record() {
        let records = vec![
            record("a.c", "int a;", "vulnerability: NO | vulnerability type: N/A"),
            record("lib/b.py", "  x = 1\n", "Erro: timeout"),
            record("c.js", "let c;", "vulnerability: YES | vulnerability type: XSS"),
        ];
        let mut xlsx = read_back("qwen/qwen3-32b", &records);
        assert_eq!(xlsx.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = xlsx.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(text(range.get((0, 0))), title("qwen/qwen3-32b"));
        for (col, header) in HEADERS.iter().enumerate() {
            assert_eq!(text(range.get((1, col))), *header);
        }
        assert_eq!(range.height(), 5);
        assert_eq!(text(range.get((2, 0))), "a.c");
        assert_eq!(text(range.get((3, 1))), "x = 1");
        assert_eq!(text(range.get((3, 2))), "Erro: timeout");
        assert_eq!(
            text(range.get((4, 2))),
            "vulnerability: YES | vulnerability type: XSS"
        );

        let merged = xlsx.worksheet_merge_cells(SHEET_NAME).unwrap().unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, (0, 0));
        assert_eq!(merged[0].end, (0, 2));
    }

    #[test]
    fn empty_run_writes_single_merged_message_row() {
        let mut xlsx = read_back("gemma2-9b-it", &[]);
        let range = xlsx.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.height(), 3);
        assert_eq!(text(range.get((2, 0))), NO_FILES_MESSAGE);

        let merged = xlsx.worksheet_merge_cells(SHEET_NAME).unwrap().unwrap();
        assert!(merged
            .iter()
            .any(|dims| dims.start == (2, 0) && dims.end == (2, 2)));
    }

    #[test]
    fn oversized_cells_are_clipped_to_excel_limit() {
        let huge = "a".repeat(MAX_CELL_CHARS + 10);
        let clipped = fit_cell(&huge);
        assert_eq!(clipped.chars().count(), MAX_CELL_CHARS);
        assert!(clipped.ends_with('…'));

        let mut xlsx = read_back("m", &[record("big.c", &huge, "ok")]);
        let range = xlsx.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(text(range.get((2, 1))).chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn report_path_uses_folder_name_and_sanitized_model() {
        let root = Path::new("systemd11").join("src").join("vconsole");
        let path = report_path(&root, "meta-llama/llama-4-scout-17b-16e-instruct");
        assert_eq!(
            path,
            root.join("vconsole - meta-llama-llama-4-scout-17b-16e-instruct.xlsx")
        );
        assert_eq!(
            report_path(&root, "gemma2-9b-it"),
            root.join("vconsole - gemma2-9b-it.xlsx")
        );
    }

    #[test]
    fn write_report_saves_and_surfaces_failures() {
        let temp = tempfile::tempdir().unwrap();
        let path = report_path(temp.path(), "org/model");
        write_report(&path, "org/model", &[record("a.c", "int a;", "ok")]).unwrap();
        assert!(path.is_file());

        let bad = temp.path().join("missing-dir").join("out.xlsx");
        let err = write_report(&bad, "m", &[]).unwrap_err();
        assert!(format!("{err:#}").contains("failed to save report"));
    }
}
