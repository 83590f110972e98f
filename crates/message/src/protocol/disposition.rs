use crate::scan::{Scanner, is_space};

/// A parsed `Content-Disposition` value such as
/// `form-data; name="pics"; filename="file1.txt"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disposition {
    form_data: bool,
    name: Option<String>,
    file_name: Option<String>,
}

impl Disposition {
    /// Parses a header value, `None` when it is blank.
    ///
    /// Parameter values may be bare, or quoted with `"` or `'` where a
    /// backslash escapes the next character.
    pub fn parse(value: &str) -> Option<Self> {
        let bytes = value.trim().as_bytes();
        if bytes.is_empty() {
            return None;
        }

        let mut scanner = Scanner::new(bytes);
        let kind = scanner.take_while(|b| b != b';').trim(bytes);
        let mut disposition =
            Self { form_data: kind.as_bytes(bytes).eq_ignore_ascii_case(b"form-data"), ..Self::default() };

        while scanner.expect(b";") {
            scanner.skip_while(is_space);
            let key = scanner.take_while(|b| b != b'=' && b != b';').trim(bytes);
            if !scanner.expect(b"=") {
                continue;
            }
            scanner.skip_while(is_space);
            let value = parameter_value(&mut scanner, bytes);

            let key = key.as_bytes(bytes);
            if key.eq_ignore_ascii_case(b"name") {
                disposition.name = Some(value);
            } else if key.eq_ignore_ascii_case(b"filename") {
                disposition.file_name = Some(value);
            }
        }

        Some(disposition)
    }

    pub fn is_form_data(&self) -> bool {
        self.form_data
    }

    /// True for anything that is not a plain form field.
    pub fn is_file(&self) -> bool {
        !self.form_data || self.file_name.as_deref().is_some_and(|name| !name.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

fn parameter_value(scanner: &mut Scanner<'_>, bytes: &[u8]) -> String {
    let quote = match scanner.peek() {
        Some(quote @ (b'"' | b'\'')) => quote,
        _ => return scanner.take_while(|b| b != b';').trim(bytes).text(bytes).into_owned(),
    };
    scanner.bump();

    let mut value = Vec::new();
    while let Some(byte) = scanner.bump() {
        match byte {
            b'\\' => {
                if let Some(escaped) = scanner.bump() {
                    value.push(escaped);
                }
            }
            b if b == quote => break,
            b => value.push(b),
        }
    }
    scanner.take_while(|b| b != b';');
    crate::scan::text(&value).into_owned()
}
