use std::{
    collections::BTreeMap,
    fmt::Display,
    sync::OnceLock,
};

use regex::Regex;

use super::{
    field::{FieldSync, MaskKind, SyncToken},
    masks::{is_canonical_date, is_valid_email, normalize_email, unmask_date, unmask_phone},
    participant::{Participant, ParticipantInput},
    sections::{ChurchMovement, DetailGate, Gate, Sacrament, SacramentStatus, Sacraments},
};

static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
static INSTAGRAM_REGEX: OnceLock<Regex> = OnceLock::new();

/// Free-text and masked inputs of the participant form.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum FieldId {
    Name,
    CommonName,
    BirthDate,
    Instagram,
    Address,
    Neighborhood,
    Email,
    Phone,
    FatherName,
    FatherContact,
    MotherName,
    MotherContact,
    Observations,
}

impl FieldId {
    pub const ALL: [FieldId; 13] = [
        FieldId::Name,
        FieldId::CommonName,
        FieldId::BirthDate,
        FieldId::Instagram,
        FieldId::Address,
        FieldId::Neighborhood,
        FieldId::Email,
        FieldId::Phone,
        FieldId::FatherName,
        FieldId::FatherContact,
        FieldId::MotherName,
        FieldId::MotherContact,
        FieldId::Observations,
    ];

    /// Wire name of the field.
    pub fn key(&self) -> &'static str {
        match self {
            FieldId::Name => "name",
            FieldId::CommonName => "common_name",
            FieldId::BirthDate => "birth_date",
            FieldId::Instagram => "instagram",
            FieldId::Address => "address",
            FieldId::Neighborhood => "neighborhood",
            FieldId::Email => "email",
            FieldId::Phone => "phone",
            FieldId::FatherName => "father_name",
            FieldId::FatherContact => "father_contact",
            FieldId::MotherName => "mother_name",
            FieldId::MotherContact => "mother_contact",
            FieldId::Observations => "observations",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldId::Name => "Full name *",
            FieldId::CommonName => "Common name",
            FieldId::BirthDate => "Birth date (DD/MM/YYYY)",
            FieldId::Instagram => "Instagram",
            FieldId::Address => "Address",
            FieldId::Neighborhood => "Neighborhood / community",
            FieldId::Email => "Email",
            FieldId::Phone => "Mobile phone",
            FieldId::FatherName => "Father's name",
            FieldId::FatherContact => "Father's contact",
            FieldId::MotherName => "Mother's name",
            FieldId::MotherContact => "Mother's contact",
            FieldId::Observations => "Observations",
        }
    }

    pub fn mask(&self) -> MaskKind {
        match self {
            FieldId::BirthDate => MaskKind::Date,
            FieldId::Phone | FieldId::FatherContact | FieldId::MotherContact => MaskKind::Phone,
            _ => MaskKind::Plain,
        }
    }

    fn max_len(&self) -> Option<usize> {
        match self {
            FieldId::Name | FieldId::CommonName | FieldId::Neighborhood => Some(200),
            FieldId::FatherName | FieldId::MotherName => Some(200),
            FieldId::Instagram => Some(100),
            FieldId::Address => Some(500),
            _ => None,
        }
    }

    fn read(self, values: &ParticipantInput) -> Option<&str> {
        let slot = match self {
            FieldId::Name => return Some(values.name.as_str()).filter(|n| !n.is_empty()),
            FieldId::CommonName => &values.common_name,
            FieldId::BirthDate => &values.birth_date,
            FieldId::Instagram => &values.instagram,
            FieldId::Address => &values.address,
            FieldId::Neighborhood => &values.neighborhood,
            FieldId::Email => &values.email,
            FieldId::Phone => &values.phone,
            FieldId::FatherName => &values.father_name,
            FieldId::FatherContact => &values.father_contact,
            FieldId::MotherName => &values.mother_name,
            FieldId::MotherContact => &values.mother_contact,
            FieldId::Observations => &values.observations,
        };
        slot.as_deref()
    }

    fn write(self, values: &mut ParticipantInput, value: Option<String>) {
        let slot = match self {
            FieldId::Name => {
                values.name = value.unwrap_or_default();
                return;
            }
            FieldId::CommonName => &mut values.common_name,
            FieldId::BirthDate => &mut values.birth_date,
            FieldId::Instagram => &mut values.instagram,
            FieldId::Address => &mut values.address,
            FieldId::Neighborhood => &mut values.neighborhood,
            FieldId::Email => &mut values.email,
            FieldId::Phone => &mut values.phone,
            FieldId::FatherName => &mut values.father_name,
            FieldId::FatherContact => &mut values.father_contact,
            FieldId::MotherName => &mut values.mother_name,
            FieldId::MotherContact => &mut values.mother_contact,
            FieldId::Observations => &mut values.observations,
        };
        *slot = value;
    }
}

/// A field-level validation message.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join("; "))
    }
}

/// Edit counters captured before fetching a participant.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FormTicket {
    fields: BTreeMap<FieldId, SyncToken>,
    sections: u64,
}

impl From<&Participant> for ParticipantInput {
    fn from(p: &Participant) -> Self {
        ParticipantInput {
            name: p.name.clone(),
            common_name: p.common_name.clone(),
            birth_date: p.birth_date.clone(),
            instagram: p.instagram.clone(),
            address: p.address.clone(),
            neighborhood: p.neighborhood.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            sacraments: p.sacraments.clone(),
            church_movement: p.church_movement.clone(),
            church_movement_info: p.church_movement_info.clone(),
            father_name: p.father_name.clone(),
            father_contact: p.father_contact.clone(),
            mother_name: p.mother_name.clone(),
            mother_contact: p.mother_contact.clone(),
            ecc_participant: p.ecc_participant,
            ecc_info: p.ecc_info.clone(),
            has_restrictions: p.has_restrictions,
            restrictions_info: p.restrictions_info.clone(),
            observations: p.observations.clone(),
            photo_path: p.photo_path.clone(),
        }
    }
}

/// In-memory state of the participant registration/edit form.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ParticipantForm {
    fields: BTreeMap<FieldId, FieldSync>,
    church_movement: Gate<ChurchMovement>,
    ecc: DetailGate,
    restrictions: DetailGate,
    sacraments: Sacraments,
    photo_path: Option<String>,
    section_edits: u64,
    submitting: bool,
}

impl Default for ParticipantForm {
    fn default() -> Self {
        ParticipantForm {
            fields: FieldId::ALL
                .into_iter()
                .map(|id| (id, FieldSync::new(id.mask())))
                .collect(),
            church_movement: Gate::Off,
            ecc: Gate::Off,
            restrictions: Gate::Off,
            sacraments: Sacraments::default(),
            photo_path: None,
            section_edits: 0,
            submitting: false,
        }
    }
}

impl ParticipantForm {
    pub fn field(&self, id: FieldId) -> &FieldSync {
        &self.fields[&id]
    }

    fn field_mut(&mut self, id: FieldId) -> &mut FieldSync {
        self.fields
            .entry(id)
            .or_insert_with(|| FieldSync::new(id.mask()))
    }

    pub fn display(&self, id: FieldId) -> &str {
        self.field(id).display()
    }

    /// A keystroke in a text field.
    pub fn input(&mut self, id: FieldId, raw: &str) {
        self.field_mut(id).input(raw);
    }

    pub fn clear(&mut self, id: FieldId) {
        self.field_mut(id).clear();
    }

    pub fn church_movement(&self) -> &Gate<ChurchMovement> {
        &self.church_movement
    }

    pub fn ecc(&self) -> &DetailGate {
        &self.ecc
    }

    pub fn restrictions(&self) -> &DetailGate {
        &self.restrictions
    }

    pub fn sacrament(&self, sacrament: Sacrament) -> SacramentStatus {
        self.sacraments.status(sacrament)
    }

    pub fn photo_path(&self) -> Option<&str> {
        self.photo_path.as_deref()
    }

    pub fn set_church_movement(&mut self, on: bool) {
        self.church_movement.set(on);
        self.section_edits += 1;
    }

    pub fn set_church_movement_name(&mut self, name: String) {
        if let Some(movement) = self.church_movement.detail_mut() {
            movement.name = name;
            self.section_edits += 1;
        }
    }

    pub fn set_church_movement_info(&mut self, info: Option<String>) {
        if let Some(movement) = self.church_movement.detail_mut() {
            movement.info = info;
            self.section_edits += 1;
        }
    }

    pub fn set_ecc(&mut self, on: bool) {
        self.ecc.set(on);
        self.section_edits += 1;
    }

    pub fn set_ecc_info(&mut self, info: Option<String>) {
        self.ecc.set_detail(info);
        self.section_edits += 1;
    }

    pub fn set_restrictions(&mut self, on: bool) {
        self.restrictions.set(on);
        self.section_edits += 1;
    }

    pub fn set_restrictions_info(&mut self, info: Option<String>) {
        self.restrictions.set_detail(info);
        self.section_edits += 1;
    }

    pub fn set_sacrament(&mut self, sacrament: Sacrament, status: SacramentStatus) {
        self.sacraments.set(sacrament, status);
        self.section_edits += 1;
    }

    pub fn set_photo_path(&mut self, path: Option<String>) {
        self.photo_path = path;
        self.section_edits += 1;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Raw form values, masks included. This is what drafts store.
    pub fn snapshot(&self) -> ParticipantInput {
        let mut values = ParticipantInput::default();
        for (id, field) in &self.fields {
            let value = Some(field.value()).filter(|v| !v.is_empty());
            id.write(&mut values, value.map(str::to_owned));
        }

        let (church_movement, church_movement_info) = self.church_movement.to_wire();
        let (ecc_participant, ecc_info) = self.ecc.to_wire();
        let (has_restrictions, restrictions_info) = self.restrictions.to_wire();

        values.church_movement = church_movement;
        values.church_movement_info = church_movement_info;
        values.ecc_participant = Some(ecc_participant);
        values.ecc_info = ecc_info;
        values.has_restrictions = Some(has_restrictions);
        values.restrictions_info = restrictions_info;
        values.sacraments = Some(self.sacraments.encoded().to_owned()).filter(|s| !s.is_empty());
        values.photo_path = self.photo_path.clone();
        values
    }

    fn reset_sections(&mut self, values: &ParticipantInput) {
        self.church_movement = Gate::<ChurchMovement>::from_wire(
            values.church_movement.as_deref(),
            values.church_movement_info.as_deref(),
        );
        self.ecc = DetailGate::from_wire(values.ecc_participant, values.ecc_info.as_deref());
        self.restrictions =
            DetailGate::from_wire(values.has_restrictions, values.restrictions_info.as_deref());
        self.sacraments = Sacraments::from_encoded(values.sacraments.as_deref());
        self.photo_path = values.photo_path.clone();
    }

    /// Programmatic reset from raw or canonical values.
    pub fn restore(&mut self, values: &ParticipantInput) {
        for id in FieldId::ALL {
            let value = id.read(values);
            self.field_mut(id).reset(value);
        }
        self.reset_sections(values);
    }

    pub fn load(&mut self, participant: &Participant) {
        self.restore(&ParticipantInput::from(participant));
    }

    pub fn ticket(&self) -> FormTicket {
        FormTicket {
            fields: self
                .fields
                .iter()
                .map(|(id, field)| (*id, field.token()))
                .collect(),
            sections: self.section_edits,
        }
    }

    /// Applies a participant fetched against `ticket`. Fields edited since the
    /// ticket was taken keep their local value.
    ///
    /// Returns the number of discarded fields, counting the sections as one.
    pub fn apply_fetched(&mut self, ticket: &FormTicket, participant: &Participant) -> usize {
        let values = ParticipantInput::from(participant);
        let mut discarded = 0;

        for (id, token) in &ticket.fields {
            let value = id.read(&values);
            if !self.field_mut(*id).apply_external(*token, value) {
                discarded += 1;
            }
        }

        if ticket.sections == self.section_edits {
            self.reset_sections(&values);
        } else {
            discarded += 1;
        }

        if discarded > 0 {
            log::debug!(
                "Kept {} locally edited field(s) over fetched participant {}",
                discarded,
                participant.id
            );
        }
        discarded
    }

    /// Converts the form into a request body, unmasking and checking every field.
    pub fn validate(&self) -> Result<ParticipantInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut out = ParticipantInput::default();

        for id in FieldId::ALL {
            let raw = self.field(id).value();
            let value = match id {
                FieldId::BirthDate => validate_birth_date(raw, &mut errors),
                FieldId::Email => validate_email(raw, &mut errors),
                FieldId::Phone | FieldId::FatherContact | FieldId::MotherContact => {
                    validate_phone(id, raw, &mut errors)
                }
                _ => Some(raw.to_owned()).filter(|v| !v.is_empty()),
            };

            if let (Some(value), Some(max)) = (&value, id.max_len()) {
                check_len(id.key(), value, max, &mut errors);
            }

            id.write(&mut out, value);
        }

        if out.name.is_empty() {
            errors.push("name", "Full name is required");
        }

        if let Some(instagram) = &out.instagram {
            let regex = INSTAGRAM_REGEX.get_or_init(|| Regex::new(r"^@?[a-zA-Z0-9._]+$").unwrap());
            if !regex.is_match(instagram) {
                errors.push("instagram", "Invalid Instagram handle");
            }
        }

        let (church_movement, church_movement_info) = self.church_movement.to_wire();
        if let Some(name) = &church_movement {
            check_len("church_movement", name, 200, &mut errors);
        }
        if let Some(info) = &church_movement_info {
            check_len("church_movement_info", info, 500, &mut errors);
        }

        let (ecc_participant, ecc_info) = self.ecc.to_wire();
        if let Some(info) = &ecc_info {
            check_len("ecc_info", info, 500, &mut errors);
        }

        let (has_restrictions, restrictions_info) = self.restrictions.to_wire();
        if let Some(info) = &restrictions_info {
            check_len("restrictions_info", info, 500, &mut errors);
        }

        out.church_movement = church_movement;
        out.church_movement_info = church_movement_info;
        out.ecc_participant = Some(ecc_participant);
        out.ecc_info = ecc_info;
        out.has_restrictions = Some(has_restrictions);
        out.restrictions_info = restrictions_info;
        out.sacraments = Some(self.sacraments.encoded().to_owned()).filter(|s| !s.is_empty());
        out.photo_path = self.photo_path.clone().filter(|p| !p.is_empty());

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }
}

fn check_len(field: &'static str, value: &str, max: usize, errors: &mut ValidationErrors) {
    if value.chars().count() > max {
        errors.push(field, format!("Must be at most {} characters", max));
    }
}

fn validate_birth_date(raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let canonical = unmask_date(raw).unwrap_or_else(|| raw.to_owned());
    if !is_canonical_date(&canonical) {
        errors.push("birth_date", "Invalid date, use DD/MM/YYYY");
    }
    Some(canonical)
}

fn validate_email(raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        errors.push("email", "Invalid email");
    }
    Some(email).filter(|e| !e.is_empty())
}

/// Numbers with fewer than ten digits are dropped, not reported.
fn validate_phone(id: FieldId, raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let digits = unmask_phone(raw);
    if digits.len() < 10 {
        return None;
    }

    let regex = PHONE_REGEX.get_or_init(|| Regex::new(r"^[0-9]{10,11}$").unwrap());
    if !regex.is_match(&digits) {
        let message = match id {
            FieldId::FatherContact => "Invalid father's contact, use 10 or 11 digits",
            FieldId::MotherContact => "Invalid mother's contact, use 10 or 11 digits",
            _ => "Invalid phone, use 10 or 11 digits",
        };
        errors.push(id.key(), message);
    }
    Some(digits)
}
