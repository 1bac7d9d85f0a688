pub mod date;
pub mod gemini;
pub mod streak;
