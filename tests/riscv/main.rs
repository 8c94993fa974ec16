mod emission;
mod isa;
mod table;
