use std::{io, process::ExitCode};

use rpassword::prompt_password;
use uvc_store::InfoStore;

use crate::Result;

pub async fn set_password(store: &mut InfoStore, id: &str) -> Result<ExitCode> {
    println!("This will store the administrator password for a camera ");
    println!("for later use. It will be stored on disk obscured, but ");
    println!("NOT ENCRYPTED! If this is not okay, cancel now.");
    println!();

    store_password(store, id, |prompt: &str| prompt_password(prompt)).await
}

/// Asks for the password twice through `prompt` and stores it when both
/// entries match.
async fn store_password<F>(store: &mut InfoStore, id: &str, mut prompt: F) -> Result<ExitCode>
where
    F: FnMut(&str) -> io::Result<String>,
{
    let password = prompt("Password: ")?;
    let confirm = prompt("Confirm: ")?;

    if password != confirm {
        println!("Passwords do not match");
        return Ok(ExitCode::FAILURE);
    }

    store.set_password(id, &password).await?;
    println!("Password set");
    Ok(ExitCode::SUCCESS)
}
