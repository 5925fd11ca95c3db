use super::masks::{format_date_to_brazilian, is_canonical_date, mask_date, mask_phone};

/// Which mask a field applies to its input.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum MaskKind {
    Date,
    Phone,
    Plain,
}

impl MaskKind {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            MaskKind::Date => mask_date(raw),
            MaskKind::Phone => mask_phone(raw),
            MaskKind::Plain => raw.to_owned(),
        }
    }
}

/// Edit counter captured when an external value is requested.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct SyncToken(u64);

/// Keeps a masked input's display text in step with the form value.
///
/// While the user types, the value carries the mask characters; unmasking to the
/// canonical form happens at validation time.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FieldSync {
    kind: MaskKind,
    display: String,
    value: String,
    edits: u64,
}

impl FieldSync {
    pub fn new(kind: MaskKind) -> Self {
        FieldSync {
            kind,
            display: String::new(),
            value: String::new(),
            edits: 0,
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Initial load or programmatic reset. Always applied.
    pub fn reset(&mut self, canonical: Option<&str>) {
        let canonical = canonical.unwrap_or_default();
        self.display = match self.kind {
            MaskKind::Date if is_canonical_date(canonical) => {
                format_date_to_brazilian(Some(canonical))
            }
            kind => kind.apply(canonical),
        };
        self.value = canonical.to_owned();
    }

    /// A keystroke: `raw` is the full new content of the input.
    pub fn input(&mut self, raw: &str) {
        let masked = self.kind.apply(raw);
        self.display = masked.clone();
        self.value = masked;
        self.edits += 1;
    }

    pub fn clear(&mut self) {
        self.input("");
    }

    pub fn token(&self) -> SyncToken {
        SyncToken(self.edits)
    }

    /// Applies a value fetched against `token`, unless the user edited the field since.
    ///
    /// Returns whether the value was applied.
    pub fn apply_external(&mut self, token: SyncToken, canonical: Option<&str>) -> bool {
        if token.0 != self.edits {
            log::debug!(
                "Discarding stale value for field ({} local edits since request)",
                self.edits.saturating_sub(token.0)
            );
            return false;
        }

        self.reset(canonical);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldSync, MaskKind};

    #[test]
    fn test_reset_date() {
        let mut field = FieldSync::new(MaskKind::Date);

        field.reset(Some("2001-05-09"));
        assert_eq!(field.display(), "09/05/2001");
        assert_eq!(field.value(), "2001-05-09");

        field.reset(Some("0905"));
        assert_eq!(field.display(), "09/05");

        field.reset(None);
        assert_eq!(field.display(), "");
    }

    #[test]
    fn test_reset_phone_and_plain() {
        let mut phone = FieldSync::new(MaskKind::Phone);
        phone.reset(Some("11987654321"));
        assert_eq!(phone.display(), "(11) 98765-4321");

        let mut plain = FieldSync::new(MaskKind::Plain);
        plain.reset(Some("Maria@Example.com"));
        assert_eq!(plain.display(), "Maria@Example.com");
    }

    #[test]
    fn test_input_keeps_mask_in_value() {
        let mut field = FieldSync::new(MaskKind::Date);
        field.input("3");
        field.input("31");
        field.input("311");
        assert_eq!(field.display(), "31/1");
        assert_eq!(field.value(), "31/1");

        field.input("31122024");
        assert_eq!(field.value(), "31/12/2024");
    }

    #[test]
    fn test_stale_external_value_is_discarded() {
        let mut field = FieldSync::new(MaskKind::Phone);
        let token = field.token();

        field.input("119");
        assert!(!field.apply_external(token, Some("21999999999")));
        assert_eq!(field.display(), "(11) 9");

        let token = field.token();
        assert!(field.apply_external(token, Some("21999999999")));
        assert_eq!(field.display(), "(21) 99999-9999");
    }

    #[test]
    fn test_token_from_busier_field_is_discarded() {
        let mut busy = FieldSync::new(MaskKind::Plain);
        busy.input("a");
        busy.input("ab");

        let mut field = FieldSync::new(MaskKind::Plain);
        assert!(!field.apply_external(busy.token(), Some("Maria")));
        assert_eq!(field.display(), "");
    }

    #[test]
    fn test_reset_does_not_invalidate_tokens() {
        let mut field = FieldSync::new(MaskKind::Plain);
        let token = field.token();
        field.reset(Some("Ana"));
        assert!(field.apply_external(token, Some("Ana Maria")));
        assert_eq!(field.value(), "Ana Maria");
    }
}
