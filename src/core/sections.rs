use std::{fmt::Display, str::FromStr};

/// A Yes/No question gating optional detail fields.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub enum Gate<T> {
    #[default]
    Off,
    On(T),
}

impl<T> Gate<T> {
    pub fn is_on(&self) -> bool {
        matches!(self, Gate::On(_))
    }

    pub fn detail(&self) -> Option<&T> {
        match self {
            Gate::On(detail) => Some(detail),
            Gate::Off => None,
        }
    }

    pub fn detail_mut(&mut self) -> Option<&mut T> {
        match self {
            Gate::On(detail) => Some(detail),
            Gate::Off => None,
        }
    }

    /// Switches off, dropping any detail in the same step.
    pub fn turn_off(&mut self) {
        *self = Gate::Off;
    }
}

impl<T: Default> Gate<T> {
    /// Switches on. Detail already present is kept.
    pub fn turn_on(&mut self) {
        if let Gate::Off = self {
            *self = Gate::On(T::default());
        }
    }

    pub fn set(&mut self, on: bool) {
        if on {
            self.turn_on()
        } else {
            self.turn_off()
        }
    }
}

/// A toggle with a single free-text detail, e.g. ECC or dietary restrictions.
pub type DetailGate = Gate<Option<String>>;

impl DetailGate {
    /// Builds from the wire pair. Details sent alongside a false or null flag are dropped.
    pub fn from_wire(flag: Option<bool>, detail: Option<&str>) -> Self {
        match flag {
            Some(true) => Gate::On(detail.map(str::to_owned)),
            _ => Gate::Off,
        }
    }

    pub fn to_wire(&self) -> (bool, Option<String>) {
        match self {
            Gate::On(detail) => (
                true,
                detail.as_ref().filter(|d| !d.trim().is_empty()).cloned(),
            ),
            Gate::Off => (false, None),
        }
    }

    pub fn set_detail(&mut self, detail: Option<String>) {
        if let Some(current) = self.detail_mut() {
            *current = detail;
        }
    }
}

/// Church movement membership. An empty name means "participates, name pending".
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ChurchMovement {
    pub name: String,
    pub info: Option<String>,
}

impl Gate<ChurchMovement> {
    pub fn from_wire(name: Option<&str>, info: Option<&str>) -> Self {
        match name {
            Some(name) => Gate::On(ChurchMovement {
                name: name.to_owned(),
                info: info.map(str::to_owned),
            }),
            None => Gate::Off,
        }
    }

    pub fn to_wire(&self) -> (Option<String>, Option<String>) {
        match self {
            Gate::On(movement) => (
                Some(movement.name.clone()),
                movement.info.as_ref().filter(|i| !i.trim().is_empty()).cloned(),
            ),
            Gate::Off => (None, None),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Sacrament {
    Batismo,
    PrimeiraEucaristia,
    Crisma,
}

impl Sacrament {
    pub const ALL: [Sacrament; 3] = [
        Sacrament::Batismo,
        Sacrament::PrimeiraEucaristia,
        Sacrament::Crisma,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sacrament::Batismo => "Batismo",
            Sacrament::PrimeiraEucaristia => "Primeira Eucaristia",
            Sacrament::Crisma => "Crisma",
        }
    }
}

impl Display for Sacrament {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Default)]
pub enum SacramentStatus {
    Concluido,
    NaoConcluido,
    EmProcesso,
    #[default]
    NaoInformado,
}

impl SacramentStatus {
    pub const ALL: [SacramentStatus; 4] = [
        SacramentStatus::Concluido,
        SacramentStatus::NaoConcluido,
        SacramentStatus::EmProcesso,
        SacramentStatus::NaoInformado,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SacramentStatus::Concluido => "Concluído",
            SacramentStatus::NaoConcluido => "Não Concluído",
            SacramentStatus::EmProcesso => "Em Processo",
            SacramentStatus::NaoInformado => "Não Informado",
        }
    }
}

impl Display for SacramentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SacramentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SacramentStatus::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| format!("Unknown sacrament status {}", s))
    }
}

/// Sacrament statuses encoded as `name:status` pairs joined by commas.
///
/// Pairs with status "Não Informado" are never stored. Entries keep the order in
/// which they were last set.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Sacraments {
    encoded: String,
}

impl Sacraments {
    pub fn from_encoded(encoded: Option<&str>) -> Self {
        Sacraments {
            encoded: encoded.unwrap_or_default().to_owned(),
        }
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    fn entries(&self) -> impl Iterator<Item = &str> {
        self.encoded.split(',').filter(|e| !e.is_empty())
    }

    pub fn status(&self, sacrament: Sacrament) -> SacramentStatus {
        let prefix = format!("{}:", sacrament.label());
        self.entries()
            .find_map(|e| e.strip_prefix(prefix.as_str()))
            .and_then(|status| status.parse().ok())
            .unwrap_or_default()
    }

    /// Replaces only the entry for `sacrament`, leaving the others untouched.
    pub fn set(&mut self, sacrament: Sacrament, status: SacramentStatus) {
        let prefix = format!("{}:", sacrament.label());
        let mut entries: Vec<String> = self
            .entries()
            .filter(|e| !e.starts_with(prefix.as_str()))
            .map(str::to_owned)
            .collect();

        if status != SacramentStatus::NaoInformado {
            entries.push(format!("{}{}", prefix, status.label()));
        }

        self.encoded = entries.join(",");
    }
}
