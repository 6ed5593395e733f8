pub(crate) mod bootstrap;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod layout;
pub(crate) mod runner;

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
