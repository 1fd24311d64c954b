use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use petmanager_core::api::{ApiClient, ListQuery, PhotoUpload};
use petmanager_core::auth::FileStorage;
use petmanager_core::config::{Config, StorageBackend};
use petmanager_core::http::UploadProgress;
use petmanager_core::models::{PetInput, TutorInput};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::output;
use crate::{ListArgs, PetsSubcommand, TutorsSubcommand};

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [s/N] ", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "s" | "sim" | "y" | "yes"))
}

fn read_password(label: &str) -> Result<String> {
    rpassword::prompt_password(label).context("Failed to read password")
}

impl From<&ListArgs> for ListQuery {
    fn from(args: &ListArgs) -> Self {
        let query = ListQuery::page(args.page).with_size(args.size);
        match args.name {
            Some(ref name) => query.with_name(name.clone()),
            None => query,
        }
    }
}

fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub async fn login(client: &ApiClient, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Usuário: ")?,
    };
    if username.is_empty() {
        bail!("Informe o usuário");
    }
    let password = read_password("Senha: ")?;

    client.session().login(&username, &password).await?;
    info!(username = %username, "Logged in");
    println!("Login realizado como {}.", username);

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!("Failed to save config: {:#}", e);
    }
    Ok(())
}

pub fn logout(client: &ApiClient) {
    client.session().logout();
}

pub fn status(client: &ApiClient, config: &Config) -> Result<()> {
    let session = client.session().snapshot();

    println!("API:        {}", client.base_url());
    println!(
        "Sessão:     {}",
        if session.is_authenticated { "autenticada" } else { "não autenticada" }
    );
    println!(
        "Refresh:    {}",
        if session.refresh_token.is_some() { "disponível" } else { "ausente" }
    );
    println!("Usuário:    {}", config.last_username.as_deref().unwrap_or("-"));

    match config.token_storage {
        StorageBackend::Keyring => println!("Tokens:     chaveiro do sistema"),
        StorageBackend::File => {
            let storage = FileStorage::new(config.cache_dir()?);
            println!("Tokens:     {}", storage.path().display());
            if let Some(updated) = storage.updated_at()? {
                println!("Atualizado: {}", updated.format("%d/%m/%Y %H:%M:%S UTC"));
            }
        }
    }
    Ok(())
}

pub async fn register(client: &ApiClient, username: &str) -> Result<()> {
    let password = read_password("Senha: ")?;
    let again = read_password("Confirme a senha: ")?;
    if password != again {
        bail!("As senhas não conferem");
    }
    client.session().register(username, &password).await?;
    println!("Conta criada. Execute `petmanager login -u {}` para entrar.", username);
    Ok(())
}

/// Run an upload, drawing a progress line on stderr while it streams.
async fn with_progress<F, Fut, T>(upload: F) -> T
where
    F: FnOnce(mpsc::UnboundedSender<UploadProgress>) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<UploadProgress>();

    let printer = tokio::spawn(async move {
        let mut drew = false;
        while let Some(progress) = rx.recv().await {
            eprint!("\rEnviando foto... {:>3}%", progress.percent());
            drew = true;
        }
        if drew {
            eprintln!();
        }
    });

    let result = upload(tx).await;
    let _ = printer.await;
    result
}

pub async fn pets(client: &ApiClient, command: PetsSubcommand, json: bool) -> Result<()> {
    let pets = client.pets();

    match command {
        PetsSubcommand::List(args) => {
            let page = pets.list(&ListQuery::from(&args)).await?;
            if json {
                output::print_json(&page)
            } else {
                output::print_pet_page(&page);
                Ok(())
            }
        }
        PetsSubcommand::Show { id } => {
            let pet = pets.get(id).await?;
            if json {
                output::print_json(&pet)
            } else {
                output::print_pet(&pet);
                Ok(())
            }
        }
        PetsSubcommand::Create {
            name,
            breed,
            age,
            photo,
        } => {
            let input = PetInput {
                name,
                breed,
                age: Some(age),
            };
            let Some(path) = photo else {
                let pet = pets.create(&input).await?;
                println!("Pet cadastrado com sucesso! (ID {})", pet.id);
                return Ok(());
            };

            // Read and check the photo before creating anything
            let photo = PhotoUpload::from_file(&path)?;
            let (pet, uploaded) =
                with_progress(|tx| pets.create_with_photo(&input, photo, Some(tx))).await?;
            match uploaded {
                Ok(_) => println!("Pet cadastrado com sucesso! (ID {})", pet.id),
                Err(e) => {
                    warn!(id = pet.id, error = %e, "Photo upload failed");
                    println!(
                        "Pet cadastrado (ID {}), mas erro ao enviar foto. Tente novamente mais tarde.",
                        pet.id
                    );
                }
            }
            Ok(())
        }
        PetsSubcommand::Update { id, name, breed, age } => {
            let current = pets.get(id).await?;
            let mut input = PetInput::from(&current);
            if let Some(name) = name {
                input.name = name;
            }
            if breed.is_some() {
                input.breed = breed;
            }
            if age.is_some() {
                input.age = age;
            }
            pets.update(id, &input).await?;
            println!("Pet atualizado com sucesso!");
            Ok(())
        }
        PetsSubcommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Excluir o pet {}?", id))? {
                println!("Operação cancelada.");
                return Ok(());
            }
            pets.delete(id).await?;
            println!("Pet excluído com sucesso!");
            Ok(())
        }
        PetsSubcommand::Photo { id, path } => {
            let photo = PhotoUpload::from_file(&path)?;
            let photo = with_progress(|tx| pets.upload_photo(id, photo, Some(tx))).await?;
            println!("Foto enviada: {}", photo.url);
            Ok(())
        }
    }
}

pub async fn tutors(client: &ApiClient, command: TutorsSubcommand, json: bool) -> Result<()> {
    let tutors = client.tutors();

    match command {
        TutorsSubcommand::List(args) => {
            let page = tutors.list(&ListQuery::from(&args)).await?;
            if json {
                output::print_json(&page)
            } else {
                output::print_tutor_page(&page);
                Ok(())
            }
        }
        TutorsSubcommand::Show { id } => {
            let tutor = tutors.get(id).await?;
            if json {
                output::print_json(&tutor)
            } else {
                output::print_tutor(&tutor);
                Ok(())
            }
        }
        TutorsSubcommand::Create {
            name,
            cpf,
            email,
            phone,
            address,
        } => {
            let input = TutorInput {
                name,
                cpf: only_digits(&cpf),
                email: Some(email),
                phone: Some(only_digits(&phone)),
                address,
            };
            let tutor = tutors.create(&input).await?;
            println!("Tutor cadastrado com sucesso! (ID {})", tutor.id);
            Ok(())
        }
        TutorsSubcommand::Update {
            id,
            name,
            cpf,
            email,
            phone,
            address,
        } => {
            let current = tutors.get(id).await?;
            let mut input = TutorInput::from(&current);
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(cpf) = cpf {
                input.cpf = only_digits(&cpf);
            }
            if email.is_some() {
                input.email = email;
            }
            if let Some(phone) = phone {
                input.phone = Some(only_digits(&phone));
            }
            if address.is_some() {
                input.address = address;
            }
            tutors.update(id, &input).await?;
            println!("Tutor atualizado com sucesso!");
            Ok(())
        }
        TutorsSubcommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Excluir o tutor {}?", id))? {
                println!("Operação cancelada.");
                return Ok(());
            }
            tutors.delete(id).await?;
            println!("Tutor excluído com sucesso!");
            Ok(())
        }
        TutorsSubcommand::Pets { id, list } => {
            let page = tutors.pets(id, &ListQuery::from(&list)).await?;
            if json {
                output::print_json(&page)
            } else {
                output::print_pet_page(&page);
                Ok(())
            }
        }
        TutorsSubcommand::Link { tutor_id, pet_id } => {
            tutors.link_pet(tutor_id, pet_id).await?;
            println!("Pet vinculado com sucesso!");
            Ok(())
        }
        TutorsSubcommand::Unlink { tutor_id, pet_id, yes } => {
            if !yes && !confirm(&format!("Desvincular o pet {} do tutor {}?", pet_id, tutor_id))? {
                println!("Operação cancelada.");
                return Ok(());
            }
            tutors.unlink_pet(tutor_id, pet_id).await?;
            println!("Pet desvinculado com sucesso!");
            Ok(())
        }
        TutorsSubcommand::Photo { id, path } => {
            let photo = PhotoUpload::from_file(&path)?;
            let photo = with_progress(|tx| tutors.upload_photo(id, photo, Some(tx))).await?;
            println!("Foto enviada: {}", photo.url);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_to_query() {
        let args = ListArgs {
            page: 2,
            size: 5,
            name: Some("Rex".to_string()),
        };
        let query = ListQuery::from(&args);
        assert_eq!(query, ListQuery::page(2).with_size(5).with_name("Rex"));
    }

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("123.456.789-01"), "12345678901");
        assert_eq!(only_digits("(65) 99999-8888"), "65999998888");
    }
}
