mod project_tests;
mod property_tests;
