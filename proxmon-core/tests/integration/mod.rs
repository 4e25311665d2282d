mod config_file_tests;
mod scheduler_tests;
