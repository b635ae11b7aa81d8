mod common;
mod submission;
