pub mod object_storage;
