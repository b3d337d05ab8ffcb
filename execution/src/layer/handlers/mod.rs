mod economy;
mod rewards;
