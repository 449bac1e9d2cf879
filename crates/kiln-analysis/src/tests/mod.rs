mod classpath_tests;
mod session_tests;
