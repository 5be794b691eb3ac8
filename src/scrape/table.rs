use crate::error::ExtractError;

/// Text of every cell in one table row, in document order
pub type RawRow = Vec<String>;

/// Turns a history page into rows of cell text.
///
/// The pipeline depends only on this trait, never on how the markup is
/// walked.
pub trait TableExtractor {
    fn extract(&self, markup: &str) -> Result<Vec<RawRow>, ExtractError>;
}

/// Tolerant tag scanner for `<tr>`/`<td>` tables.
///
/// Tag names match case-insensitively and closing tags are optional: a row
/// ends at `</tr>`, the next `<tr`, `</table>` or end of input, and a cell
/// ends at `</td>`, the next `<td` or the end of its row. Rows without `<td>`
/// cells (header rows) are skipped. Comments and the bodies of `<script>` and
/// `<style>` elements are not markup and never produce rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagScanExtractor;

impl TableExtractor for TagScanExtractor {
    fn extract(&self, markup: &str) -> Result<Vec<RawRow>, ExtractError> {
        // Blanking and ASCII lowering both keep byte offsets valid for `markup`
        let markup = &blank_raw_text(markup);
        let lower = markup.to_ascii_lowercase();
        let mut rows = Vec::new();
        let mut pos = 0;

        while let Some(open) = find_open_tag(&lower, "tr", pos) {
            let body_start = tag_end(&lower, "tr", open)?;
            let body_end = [
                find_from(&lower, "</tr", body_start),
                find_open_tag(&lower, "tr", body_start),
                find_from(&lower, "</table", body_start),
            ]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(lower.len());

            let cells = extract_cells(markup, &lower, body_start, body_end)?;
            if !cells.is_empty() {
                rows.push(cells);
            }
            pos = body_end;
        }

        if rows.is_empty() {
            return Err(ExtractError::NoRows);
        }
        tracing::debug!("Extracted {} table rows", rows.len());
        Ok(rows)
    }
}

fn extract_cells(markup: &str, lower: &str, start: usize, end: usize) -> Result<RawRow, ExtractError> {
    let row = &lower[..end];
    let mut cells = Vec::new();
    let mut pos = start;

    while let Some(open) = find_open_tag(row, "td", pos) {
        let body_start = tag_end(row, "td", open)?;
        let body_end = [find_from(row, "</td", body_start), find_open_tag(row, "td", body_start)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(end);

        cells.push(cell_text(&markup[body_start..body_end]));
        pos = body_end;
    }

    Ok(cells)
}

/// Replaces comments and `<script>`/`<style>` elements with spaces of the same
/// byte length. An unterminated one runs to the end of input.
fn blank_raw_text(markup: &str) -> String {
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut pos = 0;

    loop {
        let next = [
            find_from(&lower, "<!--", pos).map(|at| (at, "-->")),
            find_open_tag(&lower, "script", pos).map(|at| (at, "</script")),
            find_open_tag(&lower, "style", pos).map(|at| (at, "</style")),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|(at, _)| *at);

        let Some((start, terminator)) = next else {
            out.push_str(&markup[pos..]);
            return out;
        };

        // Skip past the opening tag so `<!-->` and `<script>` do not match themselves
        let body = if terminator == "-->" { start + 4 } else { start + 1 };
        let end = match find_from(&lower, terminator, body) {
            Some(close) if terminator == "-->" => close + terminator.len(),
            Some(close) => find_from(&lower, ">", close).map_or(lower.len(), |i| i + 1),
            None => lower.len(),
        };

        out.push_str(&markup[pos..start]);
        out.extend(std::iter::repeat(' ').take(end - start));
        pos = end;
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| i + from)
}

/// Finds `<name` followed by whitespace, `>` or `/`, so `<tr` skips `<track`
fn find_open_tag(haystack: &str, name: &str, from: usize) -> Option<usize> {
    let needle = format!("<{}", name);
    let mut pos = from;

    while let Some(at) = find_from(haystack, &needle, pos) {
        let next = haystack[at + needle.len()..].chars().next();
        match next {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => return Some(at),
            None => return Some(at),
            _ => pos = at + needle.len(),
        }
    }
    None
}

/// Byte offset just past the `>` closing the tag opened at `open`
fn tag_end(haystack: &str, tag: &'static str, open: usize) -> Result<usize, ExtractError> {
    find_from(haystack, ">", open)
        .map(|i| i + 1)
        .ok_or(ExtractError::UnterminatedTag { tag, offset: open })
}

/// Visible text of a cell: tags dropped, entities decoded, whitespace collapsed
fn cell_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    decode_entities(&text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&deg;", "°")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table class="history-table">
  <tr><th>日期</th><th>最高温</th><th>最低温</th><th>天气</th><th>风力风向</th></tr>
  <tr>
    <td>2023-10-01 周日</td>
    <td style="color:#ff5040;">25°</td>
    <td style="color:#3097fd;">15°</td>
    <td>多云</td>
    <td>东北风2级</td>
    <td><span class="history-aqi wea-aqi-2">55 良</span></td>
  </tr>
  <TR><TD>2023-10-02 周一</TD><TD>24&deg;</TD><TD>14°</TD><TD>晴</TD></TR>
</table>
</body></html>
"#;

    #[test]
    fn test_extracts_data_rows_and_skips_header() {
        let rows = TagScanExtractor.extract(PAGE).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2023-10-01 周日", "25°", "15°", "多云", "东北风2级", "55 良"]);
        assert_eq!(rows[1], vec!["2023-10-02 周一", "24°", "14°", "晴"]);
    }

    #[test]
    fn test_unclosed_rows_and_cells() {
        let markup = "<table><tr><td>a<td>b &amp; c<tr><td> x\n y </table><tr><td>after";
        let rows = TagScanExtractor.extract(markup).unwrap();
        assert_eq!(rows, vec![vec!["a", "b & c"], vec!["x y"], vec!["after"]]);
    }

    #[test]
    fn test_similar_tag_names_are_not_rows() {
        let markup = "<track><tr><tdata>no</tdata><td>yes</td></tr>";
        let rows = TagScanExtractor.extract(markup).unwrap();
        assert_eq!(rows, vec![vec!["yes"]]);
    }

    #[test]
    fn test_no_rows() {
        assert_eq!(TagScanExtractor.extract("<p>nothing here</p>"), Err(ExtractError::NoRows));
        assert_eq!(TagScanExtractor.extract(""), Err(ExtractError::NoRows));
    }

    #[test]
    fn test_scripts_styles_and_comments_are_not_rows() {
        let markup = r#"<html><head>
<style>td::before { content: "<tr><td>x</td></tr>"; }</style>
<script type="text/javascript">var tpl = "<tr><td>" + day + "</td><td>" + hi + "</td></tr>";</script>
</head><body><table>
<tr><td>2023-10-01 周日</td><td>25°</td><td>15°</td><td>晴</td></tr>
<!-- <tr><td>old</td></tr> -->
</table></body></html>"#;

        let rows = TagScanExtractor.extract(markup).unwrap();

        assert_eq!(rows, vec![vec!["2023-10-01 周日", "25°", "15°", "晴"]]);
    }

    #[test]
    fn test_unterminated_comment_hides_the_rest() {
        let markup = "<table><tr><td>kept</td></tr><!-- <tr><td>lost</td></tr>";
        assert_eq!(TagScanExtractor.extract(markup).unwrap(), vec![vec!["kept"]]);

        assert_eq!(TagScanExtractor.extract("<script>'<tr><td>1'</script>"), Err(ExtractError::NoRows));
    }

    #[test]
    fn test_unterminated_tag() {
        let err = TagScanExtractor.extract("<table><tr><td>1</td><td class=\"x").unwrap_err();
        assert_eq!(err, ExtractError::UnterminatedTag { tag: "td", offset: 21 });
    }
}
