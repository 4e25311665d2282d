mod classifier_tests;
mod settings_tests;
