use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use crate::core::{
    form::{FieldId, ParticipantForm, ValidationErrors},
    sections::{Sacrament, SacramentStatus},
};

/// What the user typed for a single field.
#[derive(PartialEq, Eq, Debug)]
enum Answer {
    Keep,
    Clear,
    Value(String),
}

/// Line-driven form session.
///
/// An empty line keeps the current value and `-` clears it. End of input keeps
/// everything that is left.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn ask(&mut self, label: &str, current: &str) -> anyhow::Result<Answer> {
        if current.is_empty() {
            write!(self.output, "{}: ", label)?;
        } else {
            write!(self.output, "{} [{}]: ", label, current)?;
        }
        self.output.flush()?;

        Ok(match self.read_line()? {
            None => Answer::Keep,
            Some(line) if line.trim().is_empty() => Answer::Keep,
            Some(line) if line.trim() == "-" => Answer::Clear,
            Some(line) => Answer::Value(line),
        })
    }

    /// Yes/No question. `None` keeps the current answer.
    fn ask_bool(&mut self, question: &str, current: bool) -> anyhow::Result<Option<bool>> {
        let hint = if current { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "{} [{}]: ", question, hint)?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.trim().to_lowercase().as_str() {
                "" => return Ok(None),
                "y" | "yes" | "s" | "sim" => return Ok(Some(true)),
                "n" | "no" | "nao" | "não" => return Ok(Some(false)),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    pub fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        Ok(self.ask_bool(question, false)?.unwrap_or(false))
    }

    fn ask_detail(&mut self, label: &str, current: Option<&str>) -> anyhow::Result<Option<Option<String>>> {
        Ok(match self.ask(label, current.unwrap_or_default())? {
            Answer::Keep => None,
            Answer::Clear => Some(None),
            Answer::Value(v) => Some(Some(v)),
        })
    }

    fn ask_sacrament(
        &mut self,
        sacrament: Sacrament,
        current: SacramentStatus,
    ) -> anyhow::Result<Option<SacramentStatus>> {
        writeln!(self.output, "{} [{}]", sacrament, current)?;
        for (i, status) in SacramentStatus::ALL.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, status)?;
        }

        loop {
            write!(self.output, "Choice: ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                return Ok(None);
            }

            match line.parse::<usize>() {
                Ok(n) if (1..=SacramentStatus::ALL.len()).contains(&n) => {
                    return Ok(Some(SacramentStatus::ALL[n - 1]))
                }
                _ => writeln!(self.output, "Pick a number from 1 to {}.", SacramentStatus::ALL.len())?,
            }
        }
    }

    /// Walks through every section of the form.
    ///
    /// Returns a local photo file to upload, if one was given.
    pub fn fill(&mut self, form: &mut ParticipantForm) -> anyhow::Result<Option<PathBuf>> {
        for id in FieldId::ALL {
            match self.ask(id.label(), form.display(id))? {
                Answer::Keep => {}
                Answer::Clear => form.clear(id),
                Answer::Value(v) => {
                    form.input(id, &v);
                    if form.display(id) != v {
                        writeln!(self.output, "  -> {}", form.display(id))?;
                    }
                }
            }
        }

        if let Some(on) = self.ask_bool(
            "Takes part in a church movement?",
            form.church_movement().is_on(),
        )? {
            form.set_church_movement(on);
        }
        if let Some(movement) = form.church_movement().detail().cloned() {
            match self.ask("Movement name", &movement.name)? {
                Answer::Keep => {}
                Answer::Clear => form.set_church_movement_name(String::new()),
                Answer::Value(v) => form.set_church_movement_name(v),
            }
            if let Some(info) = self.ask_detail("Movement details", movement.info.as_deref())? {
                form.set_church_movement_info(info);
            }
        }

        if let Some(on) = self.ask_bool("Did the parents take part in ECC?", form.ecc().is_on())? {
            form.set_ecc(on);
        }
        if let Some(current) = form.ecc().detail().cloned() {
            if let Some(info) = self.ask_detail("ECC details", current.as_deref())? {
                form.set_ecc_info(info);
            }
        }

        if let Some(on) = self.ask_bool(
            "Any dietary or medical restrictions?",
            form.restrictions().is_on(),
        )? {
            form.set_restrictions(on);
        }
        if let Some(current) = form.restrictions().detail().cloned() {
            if let Some(info) = self.ask_detail("Restriction details", current.as_deref())? {
                form.set_restrictions_info(info);
            }
        }

        for sacrament in Sacrament::ALL {
            if let Some(status) = self.ask_sacrament(sacrament, form.sacrament(sacrament))? {
                form.set_sacrament(sacrament, status);
            }
        }

        Ok(match self.ask("Photo file", form.photo_path().unwrap_or_default())? {
            Answer::Keep => None,
            Answer::Clear => {
                form.set_photo_path(None);
                None
            }
            Answer::Value(v) => Some(PathBuf::from(v.trim())),
        })
    }

    pub fn say(&mut self, message: &str) -> anyhow::Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    pub fn show_errors(&mut self, errors: &ValidationErrors) -> anyhow::Result<()> {
        for error in errors.iter() {
            writeln!(self.output, "  {}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::core::participant::Participant;

    fn run(form: &mut ParticipantForm, lines: &[&str]) -> (Option<PathBuf>, String) {
        let input = Cursor::new(lines.join("\n"));
        let mut output = Vec::new();
        let photo = Prompt::new(input, &mut output).fill(form).unwrap();
        (photo, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_fill_new_form() {
        let mut form = ParticipantForm::default();
        let (photo, output) = run(
            &mut form,
            &[
                "Ana Souza", "", "01022003", "@ana", "", "", "", "11987654321", "", "", "", "", "",
                "y", "Shalom", "",
                "n",
                "yes", "Lactose",
                "1", "", "3",
                "me.png",
            ],
        );

        assert!(output.contains("  -> 01/02/2003"));
        assert_eq!(form.display(FieldId::Name), "Ana Souza");
        assert_eq!(form.display(FieldId::BirthDate), "01/02/2003");
        assert_eq!(form.display(FieldId::Phone), "(11) 98765-4321");
        assert_eq!(form.church_movement().detail().unwrap().name, "Shalom");
        assert!(!form.ecc().is_on());
        assert_eq!(form.restrictions().detail(), Some(&Some("Lactose".to_owned())));
        assert_eq!(form.sacrament(Sacrament::Batismo), SacramentStatus::Concluido);
        assert_eq!(form.sacrament(Sacrament::PrimeiraEucaristia), SacramentStatus::NaoInformado);
        assert_eq!(form.sacrament(Sacrament::Crisma), SacramentStatus::EmProcesso);
        assert_eq!(photo, Some(PathBuf::from("me.png")));

        let values = form.validate().unwrap();
        assert_eq!(values.birth_date.as_deref(), Some("2003-02-01"));
        assert_eq!(values.has_restrictions, Some(true));
    }

    #[test]
    fn test_edit_keeps_and_clears() {
        let mut form = ParticipantForm::default();
        form.load(&Participant {
            id: 3,
            name: "Maria".to_owned(),
            email: Some("maria@example.org".to_owned()),
            ecc_participant: Some(true),
            ecc_info: Some("2001".to_owned()),
            ..Default::default()
        });

        // Name kept, common name kept, birth date kept, instagram kept, address
        // kept, neighborhood kept, email cleared, then input ends.
        let (photo, output) = run(&mut form, &["", "", "", "", "", "", "-"]);

        assert!(output.contains("Full name * [Maria]: "));
        assert_eq!(form.display(FieldId::Name), "Maria");
        assert_eq!(form.display(FieldId::Email), "");
        assert_eq!(form.ecc().detail(), Some(&Some("2001".to_owned())));
        assert_eq!(photo, None);
    }

    #[test]
    fn test_reasks_on_bad_answers() {
        let mut form = ParticipantForm::default();
        let mut lines = vec![""; 13];
        lines.extend(["maybe", "n", "n", "n", "9", "2"]);
        let (_, output) = run(&mut form, &lines);

        assert!(output.contains("Please answer y or n."));
        assert!(output.contains("Pick a number from 1 to 4."));
        assert!(!form.church_movement().is_on());
        assert_eq!(form.sacrament(Sacrament::Batismo), SacramentStatus::NaoConcluido);
    }

    #[test]
    fn test_confirm() {
        let mut output = Vec::new();
        assert!(Prompt::new(Cursor::new("s\n"), &mut output).confirm("Delete?").unwrap());
        assert!(!Prompt::new(Cursor::new(""), &mut output).confirm("Delete?").unwrap());
        assert!(!Prompt::new(Cursor::new("\n"), &mut output).confirm("Delete?").unwrap());
    }
}
