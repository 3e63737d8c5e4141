
// Currently the only device supported here is Keysight's InfiniiVision DSOX1000 series.  If instruments
// from other manufacturers are ever supported, I'll probably organize them into modules by manufacturer

pub mod dsox1000;
