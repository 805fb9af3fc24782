pub mod scripted_input;
