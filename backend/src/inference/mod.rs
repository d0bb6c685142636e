pub mod decision;
pub mod model;
pub mod preprocess;

#[cfg(test)]
pub mod testing;
