use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

pub fn input(prompt: &str) -> Result<String, dialoguer::Error> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
}

pub fn select<T: ToString>(
    prompt: &str,
    items: &[T],
    default: usize,
) -> Result<usize, dialoguer::Error> {
    Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(default)
        .interact()
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool, dialoguer::Error> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
}
