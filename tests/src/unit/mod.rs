mod guard_tests;
mod session_tests;
mod settings_tests;
