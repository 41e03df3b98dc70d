// src/utils/mod.rs

pub mod db;
