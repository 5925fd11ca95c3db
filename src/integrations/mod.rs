pub mod api;
pub mod upload;

#[cfg(test)]
pub mod fake;
