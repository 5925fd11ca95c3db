use crate::{
    core::{
        draft::{DraftKey, DraftStore, Drafts},
        form::ParticipantForm,
        participant::Participant,
    },
    error::Error,
    integrations::api::ApiClient,
};

/// Marks the form as submitting for the lifetime of the guard.
struct Submitting<'a>(&'a mut ParticipantForm);

impl<'a> Submitting<'a> {
    fn begin(form: &'a mut ParticipantForm) -> Result<Self, Error> {
        if form.is_submitting() {
            return Err(Error::Busy);
        }
        form.set_submitting(true);
        Ok(Submitting(form))
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.set_submitting(false);
    }
}

/// Opens the registration form, restoring an unsaved draft if there is one.
pub fn open_registration<S: DraftStore>(drafts: &Drafts<S>) -> ParticipantForm {
    let mut form = ParticipantForm::default();
    if let Some(values) = drafts.restore(DraftKey::Registration) {
        log::info!("Restored unsaved registration for {}", values.name);
        form.restore(&values);
    }
    form
}

/// Validates and creates a participant.
///
/// If the API call fails the form is saved as a draft; on success any draft is removed.
/// Validation failures never reach the network.
pub async fn register<S: DraftStore>(
    client: &ApiClient,
    form: &mut ParticipantForm,
    drafts: &Drafts<S>,
) -> Result<Participant, Error> {
    let guard = Submitting::begin(form)?;
    let input = guard.0.validate().map_err(Error::Validation)?;

    match client.create(&input).await {
        Ok(participant) => {
            drafts.clear(DraftKey::Registration);
            log::info!("Registered {} ({})", participant.name, participant.id);
            Ok(participant)
        }
        Err(e) => {
            drafts.stash(DraftKey::Registration, &guard.0.snapshot());
            Err(e)
        }
    }
}

/// Validates and saves changes to an existing participant.
pub async fn update<S: DraftStore>(
    client: &ApiClient,
    id: i64,
    form: &mut ParticipantForm,
    drafts: &Drafts<S>,
) -> Result<Participant, Error> {
    let guard = Submitting::begin(form)?;
    let input = guard.0.validate().map_err(Error::Validation)?;

    match client.update(id, &input).await {
        Ok(participant) => {
            drafts.clear(DraftKey::Edit(id));
            log::info!("Updated {} ({})", participant.name, participant.id);
            Ok(participant)
        }
        Err(e) => {
            drafts.stash(DraftKey::Edit(id), &guard.0.snapshot());
            Err(e)
        }
    }
}

/// Fetches a participant into `form`, keeping anything edited while the request was in flight.
pub async fn load_for_edit(
    client: &ApiClient,
    id: i64,
    form: &mut ParticipantForm,
) -> Result<Participant, Error> {
    let ticket = form.ticket();
    let participant = client.get(id).await?;
    form.apply_fetched(&ticket, &participant);
    Ok(participant)
}
