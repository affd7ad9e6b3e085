//! Registered entity (`enhet`) as returned by the search endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered legal entity.
///
/// Only the fields used for matching and categorization are modelled;
/// everything else in the payload is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Enhet {
    /// Nine-digit organisation number.
    #[serde(default)]
    pub organisasjonsnummer: String,

    /// Registered name, usually upper-case.
    #[serde(default)]
    pub navn: String,

    pub organisasjonsform: Option<Organisasjonsform>,

    /// Primary industry code.
    pub naeringskode1: Option<Naeringskode>,
    pub naeringskode2: Option<Naeringskode>,
    pub naeringskode3: Option<Naeringskode>,

    /// Free-text business activity lines.
    #[serde(default)]
    pub aktivitet: Vec<String>,

    /// Statutory purpose lines.
    #[serde(default)]
    pub vedtektsfestet_formaal: Vec<String>,

    #[serde(default)]
    pub konkurs: bool,

    #[serde(default)]
    pub under_avvikling: bool,

    #[serde(default)]
    pub under_tvangsavvikling_eller_tvangsopplosning: bool,

    pub nedleggelsesdato: Option<NaiveDate>,

    pub slettedato: Option<NaiveDate>,
}

/// Industry code (SN2007 næringskode).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Naeringskode {
    #[serde(default)]
    pub kode: String,
    #[serde(default)]
    pub beskrivelse: String,
}

/// Legal form, e.g. `AS`, `ASA`, `ENK`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Organisasjonsform {
    pub kode: String,
    #[serde(default)]
    pub beskrivelse: String,
}

impl Enhet {
    /// False once the entity is bankrupt, in (forced) liquidation, or
    /// carries a closure or deletion date.
    pub fn is_active(&self) -> bool {
        !(self.konkurs
            || self.under_avvikling
            || self.under_tvangsavvikling_eller_tvangsopplosning
            || self.nedleggelsesdato.is_some()
            || self.slettedato.is_some())
    }

    /// Industry codes in registry order, skipping empty slots.
    pub fn naeringskoder(&self) -> Vec<&Naeringskode> {
        [&self.naeringskode1, &self.naeringskode2, &self.naeringskode3]
            .into_iter()
            .flatten()
            .filter(|nk| !nk.kode.trim().is_empty())
            .collect()
    }

    /// Activity and statutory purpose lines, activity first.
    pub fn activity_texts(&self) -> impl Iterator<Item = &str> {
        self.aktivitet
            .iter()
            .chain(self.vedtektsfestet_formaal.iter())
            .map(String::as_str)
    }
}
