mod arbitrary;
mod properties;
mod views;
