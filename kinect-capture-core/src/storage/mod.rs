pub mod checksum;
pub mod metadata;
pub mod wave_writer;
