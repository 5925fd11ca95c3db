use std::{
    fmt::Write as _,
    fs::{self, read_to_string},
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail};

use crate::{
    core::{
        draft::{DraftKey, Drafts, FileDraftStore},
        form::{FieldId, ParticipantForm},
        participant::{Page, Participant, ParticipantInput, ParticipantList},
        sections::{Sacrament, Sacraments},
    },
    error::Error,
    integrations::{api::ApiClient, upload::ImageFile},
    prompt::Prompt,
    session,
    settings::Settings,
};

pub const COMPLETE_PDF_FILE: &str = "fichas_completas.pdf";
pub const LOGO_FILE: &str = "logo.png";

/// Everything a command needs: settings, the API client and the draft store.
pub struct Context {
    pub settings: Settings,
    pub client: ApiClient,
    pub drafts: Drafts<FileDraftStore>,
}

impl Context {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = ApiClient::new(settings.api_base_url())?;
        let drafts = Drafts::new(FileDraftStore::new(settings.data_dir()));
        log::debug!("Using API at {}", client.base_url());

        Ok(Context {
            settings,
            client,
            drafts,
        })
    }
}

#[derive(Clone, Copy)]
enum Target {
    Register,
    Edit(i64),
}

impl Target {
    fn fallback(&self) -> &'static str {
        match self {
            Target::Register => "Failed to register participant",
            Target::Edit(_) => "Failed to update participant",
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub fn format_list(list: &ParticipantList, page: Page) -> String {
    let mut out = String::new();
    if list.participants.is_empty() {
        out.push_str("No participants found\n");
    }

    for p in &list.participants {
        let _ = writeln!(
            out,
            "{:>5}  {:<40}  {:<16}  {}",
            p.id,
            p.name,
            or_dash(&p.phone_display()),
            or_dash(&p.birth_date_display())
        );
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} participants)",
        page.number,
        page.total_pages(list.total),
        list.total
    );
    out
}

pub fn format_participant(p: &Participant, photo_url: Option<&str>) -> String {
    let values = ParticipantInput::from(p);
    let mut form = ParticipantForm::default();
    form.load(p);

    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", p.id, p.name);
    for id in FieldId::ALL.into_iter().skip(1) {
        let display = form.display(id);
        if !display.is_empty() {
            let _ = writeln!(out, "{}: {}", id.label(), display);
        }
    }

    let movement = form.church_movement().detail();
    let _ = writeln!(
        out,
        "Church movement: {}",
        movement.map_or("No", |m| or_dash(&m.name))
    );
    if let Some(info) = movement.and_then(|m| m.info.as_deref()) {
        let _ = writeln!(out, "  {}", info);
    }

    let gates = [
        ("ECC", values.ecc_participant, values.ecc_info.as_deref()),
        (
            "Restrictions",
            values.has_restrictions,
            values.restrictions_info.as_deref(),
        ),
    ];
    for (label, flag, info) in gates {
        let answer = if flag == Some(true) { "Yes" } else { "No" };
        let _ = writeln!(out, "{}: {}", label, answer);
        if let Some(info) = info.filter(|_| flag == Some(true)) {
            let _ = writeln!(out, "  {}", info);
        }
    }

    let sacraments = Sacraments::from_encoded(p.sacraments.as_deref());
    for sacrament in Sacrament::ALL {
        let _ = writeln!(out, "{}: {}", sacrament, sacraments.status(sacrament));
    }

    if let Some(url) = photo_url {
        let _ = writeln!(out, "Photo: {}", url);
    }
    out
}

pub async fn list(ctx: &Context, search: Option<&str>, page: u32) -> anyhow::Result<String> {
    let page = Page::new(page, ctx.settings.page_size());
    let list = ctx
        .client
        .list(page, search)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to load participants")))?;
    Ok(format_list(&list, page))
}

pub async fn show(ctx: &Context, id: i64) -> anyhow::Result<String> {
    let participant = ctx
        .client
        .get(id)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to load participant")))?;
    let photo_url = ctx.client.photo_url(participant.photo_path.as_deref());
    Ok(format_participant(&participant, photo_url.as_deref()))
}

fn read_values(file: &Path) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_str(&read_to_string(file)?)?)
}

/// Overlays the keys present in `patch` on top of `base`.
fn merge_values(base: &ParticipantInput, patch: serde_json::Value) -> anyhow::Result<ParticipantInput> {
    let mut merged = serde_json::to_value(base)?;
    match (&mut merged, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            base.extend(patch);
        }
        _ => bail!("Participant file must contain a JSON object"),
    }
    Ok(serde_json::from_value(merged)?)
}

async fn attach_photo(ctx: &Context, form: &mut ParticipantForm, file: &Path) -> Result<(), Error> {
    let image = ImageFile::open(file, ctx.settings.max_upload_bytes())?;
    let uploaded = ctx.client.upload_photo(&image).await?;
    form.set_photo_path(Some(uploaded.stored_path().to_owned()));
    Ok(())
}

async fn submit<R: BufRead, W: Write>(
    ctx: &Context,
    form: &mut ParticipantForm,
    target: Target,
    mut prompt: Option<&mut Prompt<R, W>>,
) -> anyhow::Result<Participant> {
    loop {
        if let Some(prompt) = prompt.as_mut() {
            if let Some(photo) = prompt.fill(form)? {
                if let Err(e) = attach_photo(ctx, form, &photo).await {
                    prompt.say(&e.user_message("Failed to upload photo"))?;
                }
            }
        }

        let result = match target {
            Target::Register => session::register(&ctx.client, form, &ctx.drafts).await,
            Target::Edit(id) => session::update(&ctx.client, id, form, &ctx.drafts).await,
        };

        match (result, prompt.as_mut()) {
            (Ok(participant), _) => return Ok(participant),
            (Err(Error::Validation(errors)), Some(prompt)) => {
                prompt.say("Please fix the following fields:")?;
                prompt.show_errors(&errors)?;
                if !prompt.confirm("Edit the form again?")? {
                    bail!("Form was not submitted");
                }
            }
            (Err(e @ Error::Validation(_)), None) => return Err(e.into()),
            (Err(e), _) => bail!(e.user_message(target.fallback())),
        }
    }
}

/// Registers a participant from `from`, or interactively when no file is given.
pub async fn register<R: BufRead, W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<R, W>,
    from: Option<&Path>,
) -> anyhow::Result<Participant> {
    match from {
        Some(file) => {
            let values = merge_values(&ParticipantInput::default(), read_values(file)?)?;
            let mut form = ParticipantForm::default();
            form.restore(&values);
            submit(ctx, &mut form, Target::Register, None::<&mut Prompt<R, W>>).await
        }
        None => {
            let mut form = session::open_registration(&ctx.drafts);
            if !form.display(FieldId::Name).is_empty() {
                prompt.say("Restored the form that failed to save last time.")?;
            }
            submit(ctx, &mut form, Target::Register, Some(prompt)).await
        }
    }
}

/// Edits a participant. Keys in `from` replace the stored values, everything else is kept.
pub async fn edit<R: BufRead, W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<R, W>,
    id: i64,
    from: Option<&Path>,
) -> anyhow::Result<Participant> {
    let mut form = ParticipantForm::default();
    let participant = session::load_for_edit(&ctx.client, id, &mut form)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to load participant")))?;

    match from {
        Some(file) => {
            let values = merge_values(&ParticipantInput::from(&participant), read_values(file)?)?;
            form.restore(&values);
            submit(ctx, &mut form, Target::Edit(id), None::<&mut Prompt<R, W>>).await
        }
        None => {
            if let Some(values) = ctx.drafts.restore(DraftKey::Edit(id)) {
                form.restore(&values);
                prompt.say("Restored the changes that failed to save last time.")?;
            }
            submit(ctx, &mut form, Target::Edit(id), Some(prompt)).await
        }
    }
}

/// Deletes a participant. Returns false when the user backed out.
pub async fn delete<R: BufRead, W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<R, W>,
    id: i64,
    yes: bool,
) -> anyhow::Result<bool> {
    if !yes {
        let participant = ctx
            .client
            .get(id)
            .await
            .map_err(|e| anyhow!(e.user_message("Failed to load participant")))?;
        if !prompt.confirm(&format!("Delete {} (#{})?", participant.name, id))? {
            return Ok(false);
        }
    }

    ctx.client
        .delete(id)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete participant")))?;
    Ok(true)
}

/// Uploads a photo and, with `participant`, stores it on that participant.
///
/// Returns the stored path.
pub async fn upload_photo(
    ctx: &Context,
    file: &Path,
    participant: Option<i64>,
) -> anyhow::Result<String> {
    let image = ImageFile::open(file, ctx.settings.max_upload_bytes())?;
    let uploaded = ctx
        .client
        .upload_photo(&image)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to upload photo")))?;
    let path = uploaded.stored_path().to_owned();

    if let Some(id) = participant {
        let current = ctx.client.get(id).await?;
        let mut values = ParticipantInput::from(&current);
        values.photo_path = Some(path.clone());
        ctx.client
            .update(id, &values)
            .await
            .map_err(|e| anyhow!(e.user_message("Failed to update participant")))?;
        log::info!("Set photo of participant {} to {}", id, path);
    }

    Ok(path)
}

fn save(bytes: &[u8], file: &Path) -> anyhow::Result<PathBuf> {
    fs::write(file, bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), file.display());
    Ok(file.to_owned())
}

pub async fn individual_pdf(ctx: &Context, id: i64, output: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let output = match output {
        Some(output) => output,
        None => PathBuf::from(ctx.client.get(id).await?.report_file_name()),
    };

    let bytes = ctx
        .client
        .individual_pdf(id)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to generate PDF")))?;
    save(&bytes, &output)
}

pub async fn complete_pdf(ctx: &Context, output: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let bytes = ctx
        .client
        .complete_pdf()
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to generate complete PDF")))?;
    save(&bytes, &output.unwrap_or_else(|| PathBuf::from(COMPLETE_PDF_FILE)))
}

pub async fn upload_logo(ctx: &Context, file: &Path) -> anyhow::Result<String> {
    let image = ImageFile::open(file, ctx.settings.max_upload_bytes())?;
    let uploaded = ctx
        .client
        .upload_logo(&image)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to upload logo")))?;
    Ok(uploaded.stored_path().to_owned())
}

pub async fn get_logo(ctx: &Context, output: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let bytes = ctx
        .client
        .logo()
        .await
        .map_err(|e| anyhow!(e.user_message("No logo has been uploaded")))?;
    save(&bytes, &output.unwrap_or_else(|| PathBuf::from(LOGO_FILE)))
}

pub async fn delete_logo<R: BufRead, W: Write>(
    ctx: &Context,
    prompt: &mut Prompt<R, W>,
    yes: bool,
) -> anyhow::Result<bool> {
    if !yes && !prompt.confirm("Remove the event logo?")? {
        return Ok(false);
    }

    ctx.client
        .delete_logo()
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to remove logo")))?;
    Ok(true)
}
