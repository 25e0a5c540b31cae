pub mod configuration;

pub mod error {
    pub mod toolboxerror;
}

pub mod math {
    pub mod normaldistribution;
    pub mod interpolation;
}

pub mod data {
    pub mod table;
    pub mod schema;
    pub mod dataadapter;
    pub mod memorydataadapter;
}

pub mod curve {
    pub mod curve;
    pub mod loadgrid;
    pub mod fragilitycurve;
    pub mod exceedancefrequencycurve;
}

pub mod combination {
    pub mod combinefragilitycurves;
}

pub mod integration {
    pub mod integratefragilitycurve;
    pub mod integratefragilitycurvemultiple;
}
