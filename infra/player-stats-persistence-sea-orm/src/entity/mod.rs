pub mod player_statistic;
