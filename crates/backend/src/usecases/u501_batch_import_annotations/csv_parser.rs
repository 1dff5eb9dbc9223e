use anyhow::{bail, Context, Result};

/// Строка CSV: вопрос и ответ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDraft {
    pub question: String,
    pub answer: String,
}

/// Разобрать CSV с аннотациями.
///
/// Первая строка является заголовком шаблона ("question,answer") и пропускается.
/// Колонка 1: вопрос, колонка 2: ответ, остальные игнорируются.
/// Пустые строки пропускаются; строка с одной колонкой считается ошибкой.
pub fn parse_annotations(data: &[u8]) -> Result<Vec<AnnotationDraft>> {
    let text = std::str::from_utf8(data).context("The CSV file must be UTF-8 encoded.")?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut drafts = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // +2: нумерация с 1 и строка заголовка
        let line = index + 2;
        let record = record.with_context(|| format!("Invalid CSV at line {}", line))?;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 2 {
            bail!("Line {}: expected question and answer columns", line);
        }

        let question = record.get(0).unwrap_or_default();
        let answer = record.get(1).unwrap_or_default();
        if question.is_empty() || answer.is_empty() {
            bail!("Line {}: question and answer must not be empty", line);
        }

        drafts.push(AnnotationDraft {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let csv = "question,answer\nКак сбросить пароль?,Через профиль\n\"A, B\",\"C\"\n";
        let drafts = parse_annotations(csv.as_bytes()).unwrap();
        assert_eq!(
            drafts,
            vec![
                AnnotationDraft {
                    question: "Как сбросить пароль?".into(),
                    answer: "Через профиль".into(),
                },
                AnnotationDraft {
                    question: "A, B".into(),
                    answer: "C".into(),
                },
            ]
        );
    }

    #[test]
    fn test_blank_lines_and_bom() {
        let csv = "\u{feff}question,answer\n\n q1 , a1 \n,\n";
        let drafts = parse_annotations(csv.as_bytes()).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].question, "q1");
        assert_eq!(drafts[0].answer, "a1");
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_annotations(b"question,answer\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_answer_column() {
        let err = parse_annotations(b"question,answer\nq1,a1\nq2\n").unwrap_err();
        assert!(err.to_string().contains("Line 3"));
    }

    #[test]
    fn test_not_utf8() {
        assert!(parse_annotations(&[0x71, 0x2c, 0xff, 0xfe, 0x0a]).is_err());
    }
}
