mod basis;
mod evaluation;
mod parameters;
