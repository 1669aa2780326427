pub mod stub_card;
