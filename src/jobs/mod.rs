pub mod event_sweeper;
