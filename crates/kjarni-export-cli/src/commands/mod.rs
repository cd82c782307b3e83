pub mod inspect;
pub mod names;

#[cfg(test)]
mod tests;
