//! Saved form drafts

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Subcommand;
use platform::draft::{AutosaveConfig, DraftAutosave};
use platform::storage::FileStore;

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Print a saved draft (e.g. `apply_<opportunity id>`)
    Show { form_id: String },
    /// Discard a saved draft
    Clear { form_id: String },
}

/// Draft slot for one form under the state directory
pub fn open(store: Arc<FileStore>, form_id: &str) -> DraftAutosave<FileStore> {
    DraftAutosave::new(store, form_id, &AutosaveConfig::default())
}

pub fn run(home: &Path, command: DraftCommand) -> Result<()> {
    let store = Arc::new(FileStore::new(home));
    match command {
        DraftCommand::Show { form_id } => {
            let draft = open(store, &form_id);
            let mut shown = None;
            draft.restore(|data| shown = Some(data))?;
            match shown {
                Some(data) => {
                    if let Some(at) = draft.saved_at() {
                        println!("Saved {}", at.format("%Y-%m-%d %H:%M"));
                    }
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
                None => println!("No draft for {}", form_id),
            }
        }
        DraftCommand::Clear { form_id } => {
            open(store, &form_id).clear()?;
            println!("Draft cleared");
        }
    }
    Ok(())
}
