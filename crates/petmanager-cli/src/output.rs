use anyhow::Result;
use petmanager_core::models::{Page, Pet, Tutor};
use petmanager_core::utils::{format_cpf, format_optional, format_phone, truncate_string};
use serde::Serialize;

/// Column width for names in list output
const NAME_WIDTH: usize = 28;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn phone_or_dash(tutor: &Tutor) -> String {
    match tutor.phone.as_deref() {
        Some(phone) if !phone.trim().is_empty() => format_phone(phone),
        _ => "-".to_string(),
    }
}

fn print_page_footer<T>(page: &Page<T>) {
    println!(
        "Página {} de {} ({} registros)",
        page.page + 1,
        page.page_count.max(1),
        page.total
    );
}

pub fn print_pet_page(page: &Page<Pet>) {
    if page.is_empty() {
        println!("Nenhum pet encontrado.");
        return;
    }
    println!("{:>6}  {:<28}  {:<20}  {}", "ID", "NOME", "RAÇA", "IDADE");
    for pet in &page.content {
        println!(
            "{:>6}  {:<28}  {:<20}  {}",
            pet.id,
            truncate_string(&pet.name, NAME_WIDTH),
            truncate_string(pet.display_breed(), 20),
            pet.display_age()
        );
    }
    print_page_footer(page);
}

pub fn print_pet(pet: &Pet) {
    println!("ID:     {}", pet.id);
    println!("Nome:   {}", pet.name);
    println!("Raça:   {}", pet.display_breed());
    println!("Idade:  {}", pet.display_age());
    println!("Foto:   {}", pet.photo_url());
    if pet.tutors.is_empty() {
        println!("Tutores: nenhum");
    } else {
        println!("Tutores:");
        for tutor in &pet.tutors {
            println!(
                "  {:>6}  {}  {}",
                tutor.id,
                tutor.name,
                phone_or_dash(tutor)
            );
        }
    }
}

pub fn print_tutor_page(page: &Page<Tutor>) {
    if page.is_empty() {
        println!("Nenhum tutor encontrado.");
        return;
    }
    println!("{:>6}  {:<28}  {:<16}  {}", "ID", "NOME", "TELEFONE", "E-MAIL");
    for tutor in &page.content {
        println!(
            "{:>6}  {:<28}  {:<16}  {}",
            tutor.id,
            truncate_string(&tutor.name, NAME_WIDTH),
            phone_or_dash(tutor),
            format_optional(tutor.email.as_deref(), "-")
        );
    }
    print_page_footer(page);
}

pub fn print_tutor(tutor: &Tutor) {
    println!("ID:       {}", tutor.id);
    println!("Nome:     {}", tutor.name);
    println!("CPF:      {}", tutor.cpf.as_deref().map(format_cpf).unwrap_or_else(|| "-".to_string()));
    println!("E-mail:   {}", format_optional(tutor.email.as_deref(), "-"));
    println!("Telefone: {}", phone_or_dash(tutor));
    println!("Endereço: {}", format_optional(tutor.address.as_deref(), "-"));
    println!("Foto:     {}", tutor.photo_url());
    if tutor.pets.is_empty() {
        println!("Pets: nenhum");
    } else {
        println!("Pets:");
        for pet in &tutor.pets {
            println!("  {:>6}  {}  {}", pet.id, pet.name, pet.display_breed());
        }
    }
}
